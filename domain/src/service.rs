use std::sync::Arc;

use tracing::debug;

use crate::image::check_image_refs;
use crate::params::check_params;
use crate::preprocess::preprocess;
use crate::structure::check_structure;
use crate::{CheckError, CheckRequest, ImageProbe, PromptCheckResult, Rules};

/// Rule choosing the single error reported when several stages fail.
///
/// Only the parameter and image stages can both fail in one call; earlier
/// stages return immediately.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorPriority {
    /// The latest stage wins: an image reference error hides a parameter error.
    #[default]
    LastStageWins,
    /// The earliest stage wins.
    FirstDetected,
}

impl ErrorPriority {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "last" | "last_stage_wins" => Some(ErrorPriority::LastStageWins),
            "first" | "first_detected" => Some(ErrorPriority::FirstDetected),
            _ => None,
        }
    }

    pub fn pick<'a>(&self, errors: &'a [CheckError]) -> Option<&'a CheckError> {
        match self {
            ErrorPriority::LastStageWins => errors.last(),
            ErrorPriority::FirstDetected => errors.first(),
        }
    }
}

/// Everything a check call found, before an error is chosen for reporting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub prompt: String,
    pub aspect_ratio: Option<String>,
    /// Stage errors in pipeline order.
    pub errors: Vec<CheckError>,
}

impl Evaluation {
    /// The error surfaced to callers under `priority`, if any.
    pub fn reported(&self, priority: ErrorPriority) -> Option<&CheckError> {
        priority.pick(&self.errors)
    }

    pub fn into_result(self, priority: ErrorPriority) -> PromptCheckResult {
        let error_message = self
            .reported(priority)
            .map(ToString::to_string)
            .unwrap_or_default();
        PromptCheckResult {
            prompt: self.prompt,
            aspect_ratio: self.aspect_ratio.unwrap_or_default(),
            error_message,
        }
    }
}

/// Application service running the validation pipeline.
///
/// Generic over the reachability probe; rules are shared read-only, so one
/// checker serves any number of concurrent callers.
pub struct PromptChecker<P: ImageProbe> {
    rules: Arc<Rules>,
    probe: P,
    priority: ErrorPriority,
}

impl<P: ImageProbe> PromptChecker<P> {
    pub fn new(rules: Arc<Rules>, probe: P) -> Self {
        Self {
            rules,
            probe,
            priority: ErrorPriority::default(),
        }
    }

    pub fn with_priority(mut self, priority: ErrorPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn priority(&self) -> ErrorPriority {
        self.priority
    }

    /// Run every stage and collect their errors.
    pub fn evaluate(&self, req: &CheckRequest) -> Evaluation {
        let pre = preprocess(&req.prompt);

        if let Err(err) = check_structure(&pre.prompt, req.allow_empty) {
            debug!(stage = "structure", kind = %err.kind(), "prompt rejected");
            return Evaluation {
                prompt: pre.prompt,
                aspect_ratio: None,
                errors: vec![err],
            };
        }
        if req.check_banned_words {
            if let Err(err) = self.rules.banned.check(&pre.lowered_text()) {
                debug!(stage = "banned", kind = %err.kind(), "prompt rejected");
                return Evaluation {
                    prompt: pre.prompt,
                    aspect_ratio: None,
                    errors: vec![err],
                };
            }
        }

        let mut errors = Vec::new();
        let params = check_params(&pre.prompt, &pre.lowered, &self.rules.params);
        let (prompt, aspect_ratio) = match params {
            Ok(outcome) => (outcome.prompt, outcome.aspect_ratio),
            Err(err) => {
                debug!(stage = "params", kind = %err.kind(), "prompt rejected");
                errors.push(err);
                (pre.prompt, None)
            }
        };
        // Runs even when parameters failed; see ErrorPriority.
        if let Err(err) = check_image_refs(&prompt, &pre.urls, &req.proxy, &self.probe) {
            debug!(stage = "image", kind = %err.kind(), "prompt rejected");
            errors.push(err);
        }

        Evaluation {
            prompt,
            aspect_ratio,
            errors,
        }
    }

    /// Run the pipeline and report a single error chosen by the configured priority.
    pub fn check(&self, req: &CheckRequest) -> PromptCheckResult {
        self.evaluate(req).into_result(self.priority)
    }

    /// Positional form of [`PromptChecker::check`].
    pub fn check_prompt(
        &self,
        prompt: &str,
        allow_empty: bool,
        check_banned_words: bool,
        proxy: &str,
    ) -> PromptCheckResult {
        self.check(
            &CheckRequest::new(prompt)
                .allow_empty(allow_empty)
                .check_banned_words(check_banned_words)
                .proxy(proxy),
        )
    }
}
