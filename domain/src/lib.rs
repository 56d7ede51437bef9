//! Domain library for the prompt checker.
//!
//! This crate holds the prompt and result types, the probe port (trait), the
//! error definitions and every validation stage. It performs no IO of its
//! own: reachability probing and rule loading live in adapter crates.

use std::fmt::{Display, Formatter};

use serde::Serialize;
use url::Url;

/// Documentation reference appended to image prompt errors.
pub const IMAGE_PROMPT_REF: &str = "https://docs.midjourney.com/docs/image-prompts";

/// Input of a single check call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckRequest {
    pub prompt: String,
    pub allow_empty: bool,
    pub check_banned_words: bool,
    /// Proxy address for image reachability probes. Empty disables probing.
    pub proxy: String,
}

impl CheckRequest {
    /// Request with defaults: empty prompts rejected, banned words checked, no probing.
    pub fn new<S: Into<String>>(prompt: S) -> Self {
        Self {
            prompt: prompt.into(),
            allow_empty: false,
            check_banned_words: true,
            proxy: String::new(),
        }
    }

    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    pub fn check_banned_words(mut self, check: bool) -> Self {
        self.check_banned_words = check;
        self
    }

    pub fn proxy<S: Into<String>>(mut self, proxy: S) -> Self {
        self.proxy = proxy.into();
        self
    }
}

/// Outcome of a check call. An empty `error_message` signals success; when it
/// is set, `prompt` and `aspect_ratio` are best effort only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PromptCheckResult {
    pub prompt: String,
    pub aspect_ratio: String,
    pub error_message: String,
}

impl PromptCheckResult {
    pub fn is_ok(&self) -> bool {
        self.error_message.is_empty()
    }
}

/// Read-only rule data shared by every check call.
#[derive(Clone, Debug, Default)]
pub struct Rules {
    pub params: params::ParameterRegistry,
    pub banned: banned::BannedTermSet,
}

impl Rules {
    pub fn new(params: params::ParameterRegistry, banned: banned::BannedTermSet) -> Self {
        Self { params, banned }
    }
}

/// Reachability port: issue a HEAD request through a proxy and report the
/// status code.
pub trait ImageProbe: Send + Sync {
    fn head_status(&self, url: &str, proxy: &Url) -> Result<u16, ProbeError>;
}

/// Failures reported by an [`ImageProbe`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("invalid proxy address: {0}")]
    InvalidProxy(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Tag naming the kind of a [`CheckError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    PromptEmpty,
    PromptEmptyWithParams,
    PromptTooLong,
    BannedPrompt,
    PermutationUnsupported,
    InvalidParamFormat,
    UnrecognizedParam,
    InvalidParamValue,
    InvalidProxyUrl,
    InternalError,
    InvalidImageUrl,
    InvalidImageContentType,
    InvalidImagePromptPosition,
    InvalidPromptParts,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::PromptEmpty => "PromptEmpty",
            ErrorKind::PromptEmptyWithParams => "PromptEmptyWithParams",
            ErrorKind::PromptTooLong => "PromptTooLong",
            ErrorKind::BannedPrompt => "BannedPrompt",
            ErrorKind::PermutationUnsupported => "PermutationUnsupported",
            ErrorKind::InvalidParamFormat => "InvalidParamFormat",
            ErrorKind::UnrecognizedParam => "UnrecognizedParam",
            ErrorKind::InvalidParamValue => "InvalidParamValue",
            ErrorKind::InvalidProxyUrl => "InvalidProxyUrl",
            ErrorKind::InternalError => "InternalError",
            ErrorKind::InvalidImageUrl => "InvalidImageUrl",
            ErrorKind::InvalidImageContentType => "InvalidImageContentType",
            ErrorKind::InvalidImagePromptPosition => "InvalidImagePromptPosition",
            ErrorKind::InvalidPromptParts => "InvalidPromptParts",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every way a prompt can be rejected. `Display` renders the message surfaced
/// to callers in [`PromptCheckResult::error_message`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    #[error("Prompt is empty, please enter a prompt")]
    PromptEmpty,
    #[error("Prompt is empty, not allowed to start with -- params")]
    PromptEmptyWithParams,
    #[error("Prompt is too long, limited to {} characters", structure::MAX_PROMPT_CHARS)]
    PromptTooLong,
    #[error("Banned Prompt: {0}")]
    BannedPrompt(String),
    #[error("Permutation Not Supported")]
    PermutationUnsupported,
    #[error("Invalid Param Format: {0}")]
    InvalidParamFormat(&'static str),
    #[error("Unrecognized Param: --{0}")]
    UnrecognizedParam(String),
    #[error("Invalid Param Value: --{name}{}", param_detail(.value, .hint))]
    InvalidParamValue {
        name: String,
        value: Option<String>,
        hint: Option<&'static str>,
    },
    #[error("Invalid proxy url.")]
    InvalidProxyUrl,
    #[error("Internal error.")]
    InternalError,
    #[error("Invalid image url. url: {url}, head code: {status}")]
    InvalidImageUrl { url: String, status: u16 },
    #[error(
        "Invalid image content type, file should end in .png, .gif, .webp, .jpg, or .jpeg. You can get more details at {doc} url: {0}",
        doc = IMAGE_PROMPT_REF
    )]
    InvalidImageContentType(String),
    #[error(
        "Invalid image prompt position, image prompt should go at the front of a prompt. You can get more details at {doc}",
        doc = IMAGE_PROMPT_REF
    )]
    InvalidImagePromptPosition,
    #[error(
        "Invalid prompt parts, prompts must have two images or one image and text to work. You can get more details at {doc}",
        doc = IMAGE_PROMPT_REF
    )]
    InvalidPromptParts,
}

impl CheckError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckError::PromptEmpty => ErrorKind::PromptEmpty,
            CheckError::PromptEmptyWithParams => ErrorKind::PromptEmptyWithParams,
            CheckError::PromptTooLong => ErrorKind::PromptTooLong,
            CheckError::BannedPrompt(_) => ErrorKind::BannedPrompt,
            CheckError::PermutationUnsupported => ErrorKind::PermutationUnsupported,
            CheckError::InvalidParamFormat(_) => ErrorKind::InvalidParamFormat,
            CheckError::UnrecognizedParam(_) => ErrorKind::UnrecognizedParam,
            CheckError::InvalidParamValue { .. } => ErrorKind::InvalidParamValue,
            CheckError::InvalidProxyUrl => ErrorKind::InvalidProxyUrl,
            CheckError::InternalError => ErrorKind::InternalError,
            CheckError::InvalidImageUrl { .. } => ErrorKind::InvalidImageUrl,
            CheckError::InvalidImageContentType(_) => ErrorKind::InvalidImageContentType,
            CheckError::InvalidImagePromptPosition => ErrorKind::InvalidImagePromptPosition,
            CheckError::InvalidPromptParts => ErrorKind::InvalidPromptParts,
        }
    }
}

fn param_detail(value: &Option<String>, hint: &Option<&'static str>) -> String {
    let mut out = String::new();
    if let Some(value) = value {
        out.push(' ');
        out.push_str(value);
    }
    if let Some(hint) = hint {
        out.push_str(". ");
        out.push_str(hint);
    }
    out
}

/// Return a short about/version line for the binary to print.
pub fn about() -> String {
    let pkg = env!("CARGO_PKG_NAME");
    let ver = env!("CARGO_PKG_VERSION");
    format!("{} v{} - prompt checker", pkg, ver)
}

pub mod adapters;
pub mod banned;
pub mod image;
pub mod params;
pub mod preprocess;
pub mod service;
pub mod structure;

pub use service::{ErrorPriority, Evaluation, PromptChecker};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_sets_flags() {
        let req = CheckRequest::new("cat")
            .allow_empty(true)
            .check_banned_words(false)
            .proxy("http://127.0.0.1:8080");
        assert_eq!(req.prompt, "cat");
        assert!(req.allow_empty);
        assert!(!req.check_banned_words);
        assert_eq!(req.proxy, "http://127.0.0.1:8080");
    }

    #[test]
    fn param_value_message_variants() {
        let full = CheckError::InvalidParamValue {
            name: "chaos".into(),
            value: Some("101".into()),
            hint: Some("Default: 0, Range: 0-100"),
        };
        assert_eq!(
            full.to_string(),
            "Invalid Param Value: --chaos 101. Default: 0, Range: 0-100"
        );

        let bare = CheckError::InvalidParamValue {
            name: "v".into(),
            value: Some("abc".into()),
            hint: None,
        };
        assert_eq!(bare.to_string(), "Invalid Param Value: --v abc");

        let no_value = CheckError::InvalidParamValue {
            name: "sref".into(),
            value: None,
            hint: Some("At least one url is required after --sref"),
        };
        assert_eq!(
            no_value.to_string(),
            "Invalid Param Value: --sref. At least one url is required after --sref"
        );
    }

    #[test]
    fn image_messages_carry_reference() {
        let err = CheckError::InvalidImageContentType("https://a.com/x.txt".into());
        let msg = err.to_string();
        assert!(msg.starts_with("Invalid image content type"));
        assert!(msg.contains(IMAGE_PROMPT_REF));
        assert!(msg.ends_with("url: https://a.com/x.txt"));
        assert_eq!(err.kind(), ErrorKind::InvalidImageContentType);
        assert_eq!(
            msg,
            "Invalid image content type, file should end in .png, .gif, .webp, .jpg, or .jpeg. \
             You can get more details at https://docs.midjourney.com/docs/image-prompts \
             url: https://a.com/x.txt"
        );
        assert!(CheckError::InvalidPromptParts
            .to_string()
            .ends_with("details at https://docs.midjourney.com/docs/image-prompts"));
    }

    #[test]
    fn result_serializes_flat() {
        let res = PromptCheckResult {
            prompt: "sunset".into(),
            aspect_ratio: "16:9".into(),
            error_message: String::new(),
        };
        assert_eq!(
            serde_json::to_value(&res).unwrap(),
            serde_json::json!({"prompt": "sunset", "aspect_ratio": "16:9", "error_message": ""})
        );
        assert_eq!(
            serde_json::to_value(ErrorKind::BannedPrompt).unwrap(),
            serde_json::json!("BannedPrompt")
        );
    }

    #[test]
    fn too_long_message_names_limit() {
        assert_eq!(
            CheckError::PromptTooLong.to_string(),
            "Prompt is too long, limited to 6000 characters"
        );
        assert_eq!(ErrorKind::PromptTooLong.to_string(), "PromptTooLong");
    }
}
