//! Helpers for adapters that receive model output as text.
//!
//! Models tend to wrap JSON in Markdown fences or answer hint requests with a
//! bullet list instead of an array; both shapes are accepted here.

use anyhow::{Context, Result};

use crate::models::AnalysisResult;

/// Parses an analysis payload, clamping `confidence` into `0..=100`.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult> {
    let body = strip_code_fence(raw);
    let mut analysis: AnalysisResult =
        serde_json::from_str(body).context("analysis response is not a valid result object")?;
    analysis.clamp_confidence();
    Ok(analysis)
}

/// Parses guidance hints from either a JSON string array or one hint per line.
pub fn parse_hints(raw: &str, max_hints: usize) -> Vec<String> {
    let body = strip_code_fence(raw);
    let hints: Vec<String> = match serde_json::from_str::<Vec<String>>(body) {
        Ok(list) => list,
        Err(_) => body
            .lines()
            .map(|line| line.trim_start_matches(['-', '*', '•', ' ']))
            .map(|line| line.to_string())
            .collect(),
    };

    hints
        .into_iter()
        .map(|hint| hint.trim().to_string())
        .filter(|hint| !hint.is_empty())
        .take(max_hints)
        .collect()
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    #[test]
    fn parses_fenced_analysis() {
        let raw = "```json\n{\"defectType\":\"Surface Rust\",\"severity\":\"High\",\"confidence\":87.5,\
                   \"instructions\":\"Apply inhibitor\",\"isQualitySufficient\":true,\
                   \"missingAngles\":[\"underside\"]}\n```";
        let analysis = parse_analysis(raw).unwrap();
        assert_eq!(analysis.defect_type, "Surface Rust");
        assert_eq!(analysis.severity, Severity::High);
        assert_eq!(analysis.missing_angles, vec!["underside"]);
        assert!(analysis.is_quality_sufficient);
    }

    #[test]
    fn missing_angles_default_to_empty_and_confidence_clamps() {
        let raw = r#"{"defectType":"None","severity":"Low","confidence":-4,
                      "instructions":"","isQualitySufficient":true}"#;
        let analysis = parse_analysis(raw).unwrap();
        assert!(analysis.missing_angles.is_empty());
        assert_eq!(analysis.confidence, 0.0);
    }

    #[test]
    fn rejects_unknown_severity() {
        let raw = r#"{"defectType":"Crack","severity":"Severe","confidence":50,
                      "instructions":"","isQualitySufficient":false}"#;
        assert!(parse_analysis(raw).is_err());
    }

    #[test]
    fn hints_accept_arrays_and_bullets() {
        assert_eq!(
            parse_hints(r#"["Move closer", " ", "Reduce glare"]"#, 3),
            vec!["Move closer", "Reduce glare"]
        );
        assert_eq!(
            parse_hints("- Step back\n* Hold steady\n\n• Tilt up\n- Extra", 3),
            vec!["Step back", "Hold steady", "Tilt up"]
        );
    }
}
