//! Rendering of `detect` results for the terminal
//!
//! The JSON bodies are the same ones the HTTP service returns, so scripts can
//! treat both surfaces alike.

use crate::classify::{classify, ExternalStatus};
use crate::outcome::{DetectionOutcome, FailureKind};
use crate::server::{DetectResponse, ErrorBody};
use anyhow::{Context, Result};
use serde::Serialize;

/// Exit code for a successful detection, including `unknown`
pub const EXIT_OK: i32 = 0;
pub const EXIT_BAD_INPUT: i32 = 1;
pub const EXIT_NOT_FOUND: i32 = 2;
pub const EXIT_UNAVAILABLE: i32 = 3;

/// A rendered outcome: what to print, where, and how to exit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Stdout(String),
    Stderr { text: String, exit_code: i32 },
}

impl Rendered {
    pub fn exit_code(&self) -> i32 {
        match self {
            Rendered::Stdout(_) => EXIT_OK,
            Rendered::Stderr { exit_code, .. } => *exit_code,
        }
    }
}

pub fn exit_code_for(kind: FailureKind) -> i32 {
    match classify(kind) {
        ExternalStatus::BadRequest => EXIT_BAD_INPUT,
        ExternalStatus::NotFound => EXIT_NOT_FOUND,
        ExternalStatus::InternalUnavailable => EXIT_UNAVAILABLE,
    }
}

/// JSON formatter for detection outcomes
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFormatter {
    pretty: bool,
}

impl OutputFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn render(&self, outcome: &DetectionOutcome) -> Result<Rendered> {
        if let Some(body) = DetectResponse::from_outcome(outcome) {
            return Ok(Rendered::Stdout(self.to_json(&body)?));
        }

        let kind = outcome.failure().unwrap_or(FailureKind::UpstreamUnavailable);
        Ok(Rendered::Stderr {
            text: self.to_json(&ErrorBody::from_kind(kind))?,
            exit_code: exit_code_for(kind),
        })
    }

    fn to_json<T: Serialize>(&self, value: &T) -> Result<String> {
        if self.pretty {
            serde_json::to_string_pretty(value).context("Failed to serialize to JSON")
        } else {
            serde_json::to_string(value).context("Failed to serialize to JSON")
        }
    }
}
