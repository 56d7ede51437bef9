//! `--name value` parameter scanning and validation.
//!
//! Recognized names come from a [`ParameterRegistry`] supplied at startup.
//! Semantics are data: each entry of [`PARAM_RULES`] pairs the names it
//! covers with an accepted-value predicate, a diagnostic hint and its side
//! effects (stripping, aspect ratio output). Names present in the registry
//! without a rule are accepted as-is.

use std::collections::BTreeSet;

use crate::CheckError;

/// Names documented for the generation API.
pub const STANDARD_PARAMS: &[&str] = &[
    "aspect", "ar", "chaos", "c", "iw", "quality", "q", "repeat", "r", "seed", "stop", "stylize",
    "s", "sref", "sw", "weird", "w", "version", "v",
];

/// Set of recognized parameter names (without the `--` prefix).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterRegistry {
    names: BTreeSet<String>,
}

impl ParameterRegistry {
    /// Build from raw names; a leading `--` is tolerated and names are lower-cased.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|n| {
                let n = n.as_ref().trim();
                n.strip_prefix("--").unwrap_or(n).to_lowercase()
            })
            .filter(|n| !n.is_empty())
            .collect();
        Self { names }
    }

    pub fn standard() -> Self {
        Self::new(STANDARD_PARAMS.iter().copied())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for ParameterRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Accepted-value predicate of a parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ValueRule {
    /// `width:height`, both integers.
    AspectRatio,
    IntRange { min: i64, max: i64 },
    DecimalRange { min: f64, max: f64 },
    OneOf(&'static [&'static str]),
    /// Unsigned 32-bit integer.
    Seed,
    /// Any finite decimal number.
    Decimal,
    /// A run of `http` tokens, each optionally weighted with `::<integer>`.
    StyleReferences,
}

impl ValueRule {
    /// Whether a single value token is accepted. Not meaningful for
    /// [`ValueRule::StyleReferences`], which spans several tokens.
    pub fn accepts(&self, value: &str) -> bool {
        match *self {
            ValueRule::AspectRatio => {
                let mut sides = value.split(':');
                match (sides.next(), sides.next(), sides.next()) {
                    (Some(w), Some(h), None) => w.parse::<i64>().is_ok() && h.parse::<i64>().is_ok(),
                    _ => false,
                }
            }
            ValueRule::IntRange { min, max } => value
                .parse::<i64>()
                .is_ok_and(|n| (min..=max).contains(&n)),
            ValueRule::DecimalRange { min, max } => value
                .parse::<f64>()
                .is_ok_and(|n| (min..=max).contains(&n)),
            ValueRule::OneOf(allowed) => allowed.contains(&value),
            ValueRule::Seed => value.parse::<u32>().is_ok(),
            ValueRule::Decimal => value.parse::<f64>().is_ok_and(f64::is_finite),
            ValueRule::StyleReferences => false,
        }
    }
}

/// Validation and side-effect descriptor for one parameter (and its aliases).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamRule {
    pub names: &'static [&'static str],
    pub value: ValueRule,
    /// Default/range shown in diagnostics.
    pub hint: Option<&'static str>,
    /// Removed from the final prompt text after a successful scan.
    pub strip: bool,
    /// Value is surfaced as the aspect ratio output.
    pub yields_aspect_ratio: bool,
}

impl ParamRule {
    const fn checked(
        names: &'static [&'static str],
        value: ValueRule,
        hint: Option<&'static str>,
    ) -> Self {
        Self {
            names,
            value,
            hint,
            strip: false,
            yields_aspect_ratio: false,
        }
    }
}

const SREF_MISSING_HINT: &str = "At least one url is required after --sref";
const SREF_WEIGHT_HINT: &str =
    "Relative weights should be integers, such as: '--sref urlA::2 urlB::3 urlC::5'";

pub static PARAM_RULES: &[ParamRule] = &[
    // Surfaced separately for remix/zoom defaults, so it must not stay in the text.
    ParamRule {
        names: &["aspect", "ar"],
        value: ValueRule::AspectRatio,
        hint: Some("Default: 1:1"),
        strip: true,
        yields_aspect_ratio: true,
    },
    ParamRule::checked(
        &["chaos", "c"],
        ValueRule::IntRange { min: 0, max: 100 },
        Some("Default: 0, Range: 0-100"),
    ),
    ParamRule::checked(
        &["iw"],
        ValueRule::DecimalRange { min: 0.0, max: 2.0 },
        Some("Default: 1, Range: 0-2"),
    ),
    ParamRule::checked(
        &["quality", "q"],
        ValueRule::OneOf(&[".25", ".5", "1"]),
        Some("Default: 1, Range: .25/.5/1"),
    ),
    // Not supported downstream; validated then dropped.
    ParamRule {
        names: &["repeat", "r"],
        value: ValueRule::IntRange { min: 1, max: 40 },
        hint: Some("Range: 1-40"),
        strip: true,
        yields_aspect_ratio: false,
    },
    ParamRule::checked(
        &["seed"],
        ValueRule::Seed,
        Some("Default: Random, Range: 0-4294967295"),
    ),
    ParamRule::checked(
        &["stop"],
        ValueRule::IntRange { min: 10, max: 100 },
        Some("Default: 100, Range: 10-100"),
    ),
    ParamRule::checked(
        &["stylize", "s"],
        ValueRule::IntRange { min: 0, max: 1000 },
        Some("Default: 100, Range: 0-1000"),
    ),
    ParamRule::checked(&["sref"], ValueRule::StyleReferences, None),
    ParamRule::checked(
        &["sw"],
        ValueRule::IntRange { min: 0, max: 1000 },
        Some("Default: 100, Range: 0-1000"),
    ),
    ParamRule::checked(
        &["weird", "w"],
        ValueRule::IntRange { min: 0, max: 3000 },
        Some("Default: 0, Range: 0-3000"),
    ),
    ParamRule::checked(&["version", "v"], ValueRule::Decimal, None),
];

/// Rule registered for a parameter name, if any.
pub fn rule_for(name: &str) -> Option<&'static ParamRule> {
    PARAM_RULES.iter().find(|rule| rule.names.contains(&name))
}

/// Result of a successful parameter scan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParamOutcome {
    /// Prompt text with stripped parameters removed.
    pub prompt: String,
    pub aspect_ratio: Option<String>,
}

/// Validate every `--name value` parameter of a normalized prompt.
///
/// `lowered` is the lower-cased token list of `prompt`; matching is done on
/// it while the returned text keeps the original case.
pub fn check_params(
    prompt: &str,
    lowered: &[String],
    registry: &ParameterRegistry,
) -> Result<ParamOutcome, CheckError> {
    if prompt.contains('{') || prompt.contains('}') {
        return Err(CheckError::PermutationUnsupported);
    }
    if !prompt.contains("--") {
        return Ok(ParamOutcome {
            prompt: prompt.to_string(),
            aspect_ratio: None,
        });
    }
    check_spacing(prompt)?;

    let mut aspect_ratio = None;
    let mut stripped = BTreeSet::new();

    for (index, token) in lowered.iter().enumerate() {
        let Some(name) = token.strip_prefix("--") else {
            continue;
        };
        if !registry.contains(name) {
            return Err(CheckError::UnrecognizedParam(name.to_string()));
        }
        let Some(rule) = rule_for(name) else {
            continue;
        };
        let value = lowered.get(index + 1).map(String::as_str).unwrap_or("");

        if rule.value == ValueRule::StyleReferences {
            check_style_references(name, &lowered[index + 1..])?;
            continue;
        }
        if !rule.value.accepts(value) {
            return Err(CheckError::InvalidParamValue {
                name: name.to_string(),
                value: Some(value.to_string()),
                hint: rule.hint,
            });
        }
        if rule.yields_aspect_ratio {
            aspect_ratio = Some(value.to_string());
        }
        if rule.strip {
            stripped.insert(index);
            stripped.insert(index + 1);
        }
    }

    Ok(ParamOutcome {
        prompt: strip_tokens(prompt, &stripped),
        aspect_ratio,
    })
}

/// Every `--` must start a parameter: preceded by a space (or at the start)
/// and immediately followed by its name.
fn check_spacing(prompt: &str) -> Result<(), CheckError> {
    let bytes = prompt.as_bytes();
    for (i, _) in prompt.match_indices("--") {
        if i > 0 && bytes[i - 1] != b' ' {
            return Err(CheckError::InvalidParamFormat(
                "there should be space before --",
            ));
        }
        if bytes.get(i + 2) == Some(&b' ') {
            return Err(CheckError::InvalidParamFormat(
                "there should be no space after --",
            ));
        }
    }
    Ok(())
}

/// Validate the run of URL tokens following `--sref`.
fn check_style_references(name: &str, following: &[String]) -> Result<(), CheckError> {
    let refs: Vec<&str> = following
        .iter()
        .map(String::as_str)
        .take_while(|t| t.starts_with("http"))
        .collect();

    if refs.is_empty() {
        return Err(CheckError::InvalidParamValue {
            name: name.to_string(),
            value: None,
            hint: Some(SREF_MISSING_HINT),
        });
    }
    let weights_ok = refs.iter().all(|url| match url.rsplit_once("::") {
        Some((_, weight)) => weight.parse::<i64>().is_ok(),
        None => true,
    });
    if !weights_ok {
        return Err(CheckError::InvalidParamValue {
            name: name.to_string(),
            value: None,
            hint: Some(SREF_WEIGHT_HINT),
        });
    }
    Ok(())
}

fn strip_tokens(prompt: &str, stripped: &BTreeSet<usize>) -> String {
    if stripped.is_empty() {
        return prompt.to_string();
    }
    prompt
        .split_whitespace()
        .enumerate()
        .filter(|(i, _)| !stripped.contains(i))
        .map(|(_, t)| t)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::preprocess;

    fn run(raw: &str) -> Result<ParamOutcome, CheckError> {
        let pre = preprocess(raw);
        check_params(&pre.prompt, &pre.lowered, &ParameterRegistry::standard())
    }

    fn value_error_name(err: CheckError) -> String {
        match err {
            CheckError::InvalidParamValue { name, .. } => name,
            other => panic!("expected InvalidParamValue, got {other:?}"),
        }
    }

    #[test]
    fn leading_aspect_is_extracted_and_stripped() {
        let out = run("--ar 16:9 sunset").unwrap();
        assert_eq!(out.prompt, "sunset");
        assert_eq!(out.aspect_ratio.as_deref(), Some("16:9"));
    }

    #[test]
    fn trailing_aspect_is_extracted_and_stripped() {
        let out = run("Sunset over Lake --aspect 2:3 --chaos 20").unwrap();
        assert_eq!(out.prompt, "Sunset over Lake --chaos 20");
        assert_eq!(out.aspect_ratio.as_deref(), Some("2:3"));
    }

    #[test]
    fn malformed_aspect_rejected() {
        let err = run("--ar 16:9:1 sunset").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid Param Value: --ar 16:9:1. Default: 1:1"
        );
        assert_eq!(value_error_name(err), "ar");
        assert!(run("cat --ar 16x9").is_err());
    }

    #[test]
    fn unknown_param_rejected() {
        assert_eq!(
            run("cat --nonexistent 5").unwrap_err(),
            CheckError::UnrecognizedParam("nonexistent".into())
        );
    }

    #[test]
    fn numeric_ranges_enforced() {
        assert!(run("cat --chaos 100 --stop 10 --s 1000 --weird 3000 --sw 0").is_ok());
        assert_eq!(value_error_name(run("cat --c 101").unwrap_err()), "c");
        assert_eq!(value_error_name(run("cat --stop 9").unwrap_err()), "stop");
        assert_eq!(value_error_name(run("cat --stylize -1").unwrap_err()), "stylize");
        assert_eq!(value_error_name(run("cat --w 3001").unwrap_err()), "w");
        assert_eq!(value_error_name(run("cat --sw 1001").unwrap_err()), "sw");
        assert_eq!(value_error_name(run("cat --chaos 1.5").unwrap_err()), "chaos");
    }

    #[test]
    fn decimal_and_enumerated_values() {
        assert!(run("cat --iw 1.5").is_ok());
        assert!(run("cat --iw 2.5").is_err());
        assert!(run("cat --iw nan").is_err());
        assert!(run("cat --q .25").is_ok());
        assert!(run("cat --quality 0.5").is_err());
        assert!(run("cat --v 6.1").is_ok());
        assert_eq!(
            run("cat --v abc").unwrap_err().to_string(),
            "Invalid Param Value: --v abc"
        );
    }

    #[test]
    fn seed_fits_in_u32() {
        assert!(run("cat --seed 0").is_ok());
        assert!(run("cat --seed 4294967295").is_ok());
        assert!(run("cat --seed 4294967296").is_err());
        assert!(run("cat --seed -1").is_err());
    }

    #[test]
    fn repeat_is_validated_then_removed() {
        let out = run("cat --repeat 4 --q 1").unwrap();
        assert_eq!(out.prompt, "cat --q 1");
        assert_eq!(out.aspect_ratio, None);
        assert_eq!(value_error_name(run("cat --r 41").unwrap_err()), "r");
    }

    #[test]
    fn stripping_keeps_original_case() {
        let out = run("A Red Fox --AR 3:2 In Snow").unwrap();
        assert_eq!(out.prompt, "A Red Fox In Snow");
        assert_eq!(out.aspect_ratio.as_deref(), Some("3:2"));
    }

    #[test]
    fn last_aspect_wins() {
        let out = run("cat --ar 1:1 --ar 4:3").unwrap();
        assert_eq!(out.prompt, "cat");
        assert_eq!(out.aspect_ratio.as_deref(), Some("4:3"));
    }

    #[test]
    fn style_references_with_weights() {
        let raw = "--sref https://a.com/x.png::2 https://b.com/y.jpg::3 city";
        let out = run(raw).unwrap();
        assert_eq!(out.prompt, raw);
        assert_eq!(out.aspect_ratio, None);

        let err = run("--sref https://a.com/x.png::abc city").unwrap_err();
        assert_eq!(value_error_name(err), "sref");
    }

    #[test]
    fn style_references_require_a_url() {
        let err = run("cat --sref city").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid Param Value: --sref. At least one url is required after --sref"
        );
        assert!(run("cat --sref").is_err());
    }

    #[test]
    fn missing_value_is_rejected() {
        assert_eq!(value_error_name(run("cat --chaos").unwrap_err()), "chaos");
    }

    #[test]
    fn permutations_rejected_before_anything_else() {
        assert_eq!(
            run("a {red, blue} bird --nope").unwrap_err(),
            CheckError::PermutationUnsupported
        );
    }

    #[test]
    fn spacing_guard() {
        assert_eq!(
            run("cat-- ar 1:1").unwrap_err(),
            CheckError::InvalidParamFormat("there should be space before --")
        );
        assert_eq!(
            run("cat -- ar 1:1").unwrap_err(),
            CheckError::InvalidParamFormat("there should be no space after --")
        );
        assert!(run("cat ----ar 1:1").is_err());
    }

    #[test]
    fn prompts_without_params_pass_through() {
        let out = run("a quiet harbor at dawn").unwrap();
        assert_eq!(out.prompt, "a quiet harbor at dawn");
        assert_eq!(out.aspect_ratio, None);
    }

    #[test]
    fn registry_names_without_rules_are_accepted() {
        let registry = ParameterRegistry::new(["--tile", "ar", "NO"]);
        let pre = preprocess("cat --tile --no dogs --ar 1:2");
        let out = check_params(&pre.prompt, &pre.lowered, &registry).unwrap();
        assert_eq!(out.prompt, "cat --tile --no dogs");
        assert_eq!(out.aspect_ratio.as_deref(), Some("1:2"));

        let pre = preprocess("cat --chaos 5");
        assert_eq!(
            check_params(&pre.prompt, &pre.lowered, &registry).unwrap_err(),
            CheckError::UnrecognizedParam("chaos".into())
        );
    }

    #[test]
    fn every_standard_name_has_a_rule() {
        for name in STANDARD_PARAMS {
            assert!(rule_for(name).is_some(), "missing rule for {name}");
        }
        assert_eq!(ParameterRegistry::standard().len(), STANDARD_PARAMS.len());
    }
}
