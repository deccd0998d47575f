use crate::core::Report;
use std::fmt::Write;

pub const SYSTEM_PROMPT: &str = "You are an infrastructure-as-code security expert. \
You review findings produced by automated IaC scanners and explain them to engineers. \
Be concrete and actionable. Do not invent findings that are not in the input.";

/// Renders a scan report into the user prompt sent to the model.
///
/// The prompt asks for four sections so the commentary comes back in a
/// predictable shape even though we treat the response as free text.
pub fn build_enrichment_prompt(report: &Report) -> String {
    let mut prompt = String::new();

    writeln!(prompt, "Scan target: {}", report.target).ok();
    writeln!(
        prompt,
        "Findings by severity: critical={}, high={}, medium={}, low={}, info={}",
        report.summary.critical,
        report.summary.high,
        report.summary.medium,
        report.summary.low,
        report.summary.info
    )
    .ok();
    writeln!(prompt).ok();

    if report.findings.is_empty() {
        writeln!(prompt, "No findings were reported.").ok();
    } else {
        writeln!(prompt, "Findings:").ok();
        for finding in &report.findings {
            writeln!(
                prompt,
                "- [{}] {} ({}) on `{}` reported by {}: {}",
                finding.severity,
                finding.rule_id,
                finding.title,
                finding.resource,
                finding.provenance.join(", "),
                finding.description
            )
            .ok();
            if let Some(remediation) = &finding.remediation {
                writeln!(prompt, "  remediation hint: {remediation}").ok();
            }
        }
    }

    writeln!(prompt).ok();
    writeln!(prompt, "Provide your analysis in four sections:").ok();
    writeln!(prompt, "1. Summary - overall security posture in a short paragraph.").ok();
    writeln!(
        prompt,
        "2. Prioritized issues - the findings to fix first and why, highest risk first."
    )
    .ok();
    writeln!(prompt, "3. Recommendations - concrete remediation steps.").ok();
    writeln!(
        prompt,
        "4. Additional concerns - risks suggested by the findings but not directly reported."
    )
    .ok();

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Finding, Severity};

    fn sample_report() -> Report {
        let findings = vec![Finding {
            plugin: "checkov".to_string(),
            rule_id: "CKV_AWS_19".to_string(),
            severity: Severity::High,
            resource: "aws_s3_bucket.data".to_string(),
            title: "S3 bucket not encrypted".to_string(),
            description: "Bucket has no server-side encryption".to_string(),
            remediation: Some("Enable SSE-KMS".to_string()),
            location: None,
            provenance: vec!["checkov".to_string()],
        }];
        Report::new("/tmp/project".to_string(), Vec::new(), findings)
    }

    #[test]
    fn prompt_includes_findings_and_sections() {
        let prompt = build_enrichment_prompt(&sample_report());
        assert!(prompt.contains("CKV_AWS_19"));
        assert!(prompt.contains("aws_s3_bucket.data"));
        assert!(prompt.contains("Prioritized issues"));
        assert!(prompt.contains("remediation hint: Enable SSE-KMS"));
    }

    #[test]
    fn empty_report_says_so() {
        let report = Report::new("/tmp/empty".to_string(), Vec::new(), Vec::new());
        let prompt = build_enrichment_prompt(&report);
        assert!(prompt.contains("No findings were reported."));
    }

}
