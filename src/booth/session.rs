//! Wizard state for one booth visitor

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::booth::progress::ProgressCurve;
use crate::error::{AppError, Result};
use crate::generation::{prompts, PortraitSet};
use crate::media::data_url;

/// Optional subject hint prepended to the theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
        }
    }
}

/// Work that keeps a session busy until it completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Transform,
    Edit,
    Email,
}

/// Where the visitor is in the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Consent,
    Capture,
    Theme,
    Transform,
    Edit,
    Deliver,
}

/// Inputs for a themed transformation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformJob {
    pub image: String,
    pub theme: String,
    pub style: String,
}

/// Inputs for an edit of the current result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditJob {
    pub image: String,
    pub prompt: String,
}

/// Client-facing view of a session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub stage: Stage,
    pub consented: bool,
    pub has_capture: bool,
    pub theme: Option<String>,
    pub gender: Option<Gender>,
    pub style: Option<String>,
    pub processed_image: Option<String>,
    pub headshot_image: Option<String>,
    pub edit_mode: bool,
    pub has_edited: bool,
    pub retakes_remaining: u32,
    pub processing: Option<Operation>,
    pub progress: u8,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct BoothSession {
    id: Uuid,
    consented: bool,
    captured: Option<String>,
    theme: Option<String>,
    gender: Option<Gender>,
    style: Option<String>,
    processed: Option<String>,
    headshot: Option<String>,
    edit_mode: bool,
    has_edited: bool,
    retakes_used: u32,
    max_retakes: u32,
    last_error: Option<String>,
    in_flight: Option<(Operation, Instant)>,
    last_active: Instant,
}

fn policy(message: &str) -> AppError {
    AppError::Policy(message.to_string())
}

impl BoothSession {
    pub fn new(max_retakes: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            consented: false,
            captured: None,
            theme: None,
            gender: None,
            style: None,
            processed: None,
            headshot: None,
            edit_mode: false,
            has_edited: false,
            retakes_used: 0,
            max_retakes,
            last_error: None,
            in_flight: None,
            last_active: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }

    pub fn headshot(&self) -> Option<&str> {
        self.headshot.as_deref()
    }

    pub fn processing(&self) -> Option<Operation> {
        self.in_flight.map(|(op, _)| op)
    }

    pub fn stage(&self) -> Stage {
        if !self.consented {
            Stage::Consent
        } else if self.captured.is_none() {
            Stage::Capture
        } else if self.processed.is_none() {
            if self.theme.is_none() {
                Stage::Theme
            } else {
                Stage::Transform
            }
        } else if self.has_edited && !self.edit_mode {
            Stage::Deliver
        } else {
            Stage::Edit
        }
    }

    fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.in_flight.is_some() {
            return Err(AppError::Busy);
        }
        Ok(())
    }

    fn ensure_consented(&self) -> Result<()> {
        if !self.consented {
            return Err(policy("Please accept the booth terms before continuing."));
        }
        Ok(())
    }

    fn clear_results(&mut self) {
        self.processed = None;
        self.headshot = None;
        self.edit_mode = false;
        self.has_edited = false;
    }

    fn start(&mut self, operation: Operation) {
        self.last_error = None;
        self.in_flight = Some((operation, Instant::now()));
        self.touch();
    }

    fn finish(&mut self) {
        self.in_flight = None;
        self.touch();
    }

    /// One-time acknowledgement gating the rest of the flow
    pub fn accept_consent(&mut self) {
        self.consented = true;
        self.touch();
    }

    /// Store the captured frame
    pub fn capture(&mut self, image: String) -> Result<()> {
        self.ensure_idle()?;
        self.ensure_consented()?;
        if self.captured.is_some() {
            return Err(policy("A photo has already been captured. Use retake to replace it."));
        }
        if !data_url::is_image_data_url(&image) || data_url::DataUrl::parse(&image).payload.is_empty() {
            return Err(AppError::InvalidRequest(
                "Captured image must be an image data URL".to_string(),
            ));
        }

        self.captured = Some(image);
        self.theme = None;
        self.style = None;
        self.clear_results();
        self.last_error = None;
        self.touch();
        Ok(())
    }

    /// Discard the capture and everything derived from it
    pub fn retake(&mut self) -> Result<()> {
        self.ensure_idle()?;
        if self.retakes_used >= self.max_retakes {
            return Err(policy("You've reached the maximum number of retakes allowed."));
        }

        self.captured = None;
        self.theme = None;
        self.style = None;
        self.gender = None;
        self.clear_results();
        self.last_error = None;
        self.retakes_used += 1;
        self.touch();
        Ok(())
    }

    /// Draw a random theme for the current capture
    pub fn pick_theme<R: Rng + ?Sized>(&mut self, themes: &[String], rng: &mut R) -> Result<String> {
        self.ensure_idle()?;
        self.ensure_consented()?;
        if self.captured.is_none() {
            return Err(policy("Please capture an image first"));
        }
        if self.processed.is_some() {
            return Err(policy("This photo has already been transformed."));
        }
        let theme = themes
            .choose(rng)
            .ok_or_else(|| AppError::Internal("No themes configured".to_string()))?
            .clone();

        self.theme = Some(theme.clone());
        self.clear_results();
        self.touch();
        Ok(theme)
    }

    pub fn set_gender(&mut self, gender: Option<Gender>) -> Result<()> {
        self.ensure_idle()?;
        self.gender = gender;
        self.touch();
        Ok(())
    }

    /// Theme string sent to the provider, with the optional gender hint
    fn provider_theme(&self, theme: &str) -> String {
        match self.gender {
            Some(gender) => format!("{} {}", gender.as_str(), theme),
            None => theme.to_string(),
        }
    }

    /// Mark a transformation in flight and hand back its inputs
    pub fn begin_transform<R: Rng + ?Sized>(
        &mut self,
        styles: &[String],
        rng: &mut R,
    ) -> Result<TransformJob> {
        self.ensure_idle()?;
        self.ensure_consented()?;
        let (Some(image), Some(theme)) = (self.captured.as_ref(), self.theme.as_ref()) else {
            return Err(policy("Capture a photo and pick a theme first."));
        };
        if self.processed.is_some() {
            return Err(policy("This photo has already been transformed."));
        }
        let style = styles
            .choose(rng)
            .ok_or_else(|| AppError::Internal("No styles configured".to_string()))?
            .clone();

        let job = TransformJob {
            image: image.clone(),
            theme: self.provider_theme(theme),
            style: style.clone(),
        };
        self.style = Some(style);
        self.start(Operation::Transform);
        Ok(job)
    }

    pub fn complete_transform(&mut self, portraits: PortraitSet) {
        self.processed = Some(portraits.theme_image);
        self.headshot = Some(portraits.headshot_image);
        self.edit_mode = true;
        self.has_edited = false;
        self.finish();
    }

    /// Mark an edit in flight; needs a result in edit mode and a non-blank instruction
    pub fn begin_edit(&mut self, instruction: &str) -> Result<EditJob> {
        self.ensure_idle()?;
        let Some(image) = self.processed.as_ref() else {
            return Err(policy("There is no generated image to edit yet."));
        };
        if !self.edit_mode {
            return Err(policy("Choose retry edit to change the image again."));
        }
        if instruction.trim().is_empty() {
            return Err(AppError::InvalidRequest(
                "Describe how you want to modify the image".to_string(),
            ));
        }

        let job = EditJob {
            image: image.clone(),
            prompt: prompts::edit_instruction(instruction),
        };
        self.start(Operation::Edit);
        Ok(job)
    }

    pub fn complete_edit(&mut self, image: String) {
        self.processed = Some(image);
        self.has_edited = true;
        self.edit_mode = false;
        self.finish();
    }

    /// Re-open the edit step, which disables delivery until it completes again
    pub fn retry_edit(&mut self) -> Result<()> {
        self.ensure_idle()?;
        if self.processed.is_none() {
            return Err(policy("There is no generated image to edit yet."));
        }
        self.edit_mode = true;
        self.has_edited = false;
        self.touch();
        Ok(())
    }

    /// Image that may be downloaded or sent; only available after an edit
    pub fn deliverable(&self) -> Result<&str> {
        match self.processed.as_deref() {
            Some(image) if self.has_edited => Ok(image),
            _ => Err(policy(
                "Please edit your image before downloading or sending.",
            )),
        }
    }

    pub fn begin_email(&mut self) -> Result<String> {
        self.ensure_idle()?;
        let image = self.deliverable()?.to_string();
        self.start(Operation::Email);
        Ok(image)
    }

    pub fn complete_email(&mut self) {
        self.finish();
    }

    /// Record a failed operation; state stays where it was before the attempt
    pub fn fail(&mut self, message: String) {
        self.last_error = Some(message);
        self.finish();
    }

    pub fn snapshot(&self, curve: &ProgressCurve) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            stage: self.stage(),
            consented: self.consented,
            has_capture: self.captured.is_some(),
            theme: self.theme.clone(),
            gender: self.gender,
            style: self.style.clone(),
            processed_image: self.processed.clone(),
            headshot_image: self.headshot.clone(),
            edit_mode: self.edit_mode,
            has_edited: self.has_edited,
            retakes_remaining: self.max_retakes.saturating_sub(self.retakes_used),
            processing: self.processing(),
            progress: self
                .in_flight
                .map(|(_, started)| curve.at(started.elapsed()))
                .unwrap_or(0),
            error: self.last_error.clone(),
        }
    }
}
