use std::borrow::Cow;
use std::time::Duration;

/// How much analysis a request asks for. Each mode has its own input cap,
/// deadline, prompt template and fallback payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Review, debugging and complexity report (`/api/analyze-code`).
    Full,
    /// Short fix suggestion (`/api/debug-code`).
    Quick,
}

impl AnalysisMode {
    pub fn max_code_chars(self) -> usize {
        match self {
            Self::Full => 2000,
            Self::Quick => 1500,
        }
    }

    pub fn truncation_marker(self) -> &'static str {
        match self {
            Self::Full => "... [truncated for faster analysis]",
            Self::Quick => "... [truncated]",
        }
    }

    /// Upper bound on waiting for the model.
    pub fn timeout(self) -> Duration {
        match self {
            Self::Full => Duration::from_secs(15),
            Self::Quick => Duration::from_secs(8),
        }
    }

    /// Top-level keys a model reply must carry to be accepted.
    pub fn required_keys(self) -> &'static [&'static str] {
        match self {
            Self::Full => &["error_detection", "code_review", "summary"],
            Self::Quick => &["issue_explanation", "fixed_code"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Quick => "quick",
        }
    }
}

/// A rendered prompt together with the inputs the caller still needs after
/// the model call: the (possibly truncated) code that was sent, and what the
/// fallback payload is built from.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub text: String,
    pub code: String,
    pub truncated: bool,
    pub language: String,
    pub mode: AnalysisMode,
}

/// Cut `code` to the mode's cap, counted in characters, and append the
/// truncation marker when anything was dropped.
pub fn truncate_code(code: &str, mode: AnalysisMode) -> Cow<'_, str> {
    match code.char_indices().nth(mode.max_code_chars()) {
        None => Cow::Borrowed(code),
        Some((cut, _)) => Cow::Owned(format!("{}{}", &code[..cut], mode.truncation_marker())),
    }
}

pub fn build_prompt(code: &str, language: &str, error: Option<&str>, mode: AnalysisMode) -> Prompt {
    let code = truncate_code(code, mode);
    let truncated = matches!(code, Cow::Owned(_));

    // Only the full analysis substitutes a placeholder for missing context.
    let error = match (error.map(str::trim).filter(|e| !e.is_empty()), mode) {
        (Some(error), _) => error,
        (None, AnalysisMode::Full) => "No specific error reported",
        (None, AnalysisMode::Quick) => "",
    };

    let template = match mode {
        AnalysisMode::Full => FULL_ANALYSIS_TEMPLATE,
        AnalysisMode::Quick => QUICK_DEBUG_TEMPLATE,
    };

    let text = render(
        template,
        &[("LANGUAGE", language), ("CODE", &*code), ("ERROR", error)],
    );

    Prompt {
        text,
        code: code.into_owned(),
        truncated,
        language: language.to_string(),
        mode,
    }
}

/// Substitute `{{NAME}}` placeholders in a single left-to-right pass.
/// Substituted values are never rescanned, so user text that happens to
/// contain `{{CODE}}` stays literal. Unknown placeholders are kept as-is.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + vars.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = &after[..end];
                match vars.iter().find(|(k, _)| *k == name) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(name);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

const FULL_ANALYSIS_TEMPLATE: &str = r#"Perform a comprehensive analysis of this {{LANGUAGE}} code with detailed error detection:

```{{LANGUAGE}}
{{CODE}}
```

Error context: {{ERROR}}

Focus on debugging and error detection first. Answer with a single JSON object and nothing else, using exactly this shape. Every rating is an integer from 1 to 10.

{
    "error_detection": {
        "has_errors": true/false,
        "error_summary": "Brief description of the main errors found",
        "detailed_errors": [
            {
                "error_type": "syntax/logic/runtime/semantic",
                "line_number": "Specific line number (e.g., 5)",
                "line_content": "Exact content of the problematic line",
                "column_position": "Character position in the line if applicable",
                "error_description": "What exactly is wrong",
                "actual_error": "The specific error message or problem",
                "error_severity": "critical/high/medium/low",
                "why_it_happens": "Why this error occurs",
                "how_to_fix": "Step-by-step solution",
                "corrected_line": "Fixed version of the line",
                "corrected_code_snippet": "Fixed version of the surrounding code"
            }
        ],
        "error_categories": {
            "syntax_errors": ["Syntax problems with line numbers"],
            "logic_errors": ["Logical issues that cause wrong behavior"],
            "runtime_errors": ["Issues that would cause crashes"],
            "semantic_errors": ["Code that runs but does not do what was intended"]
        }
    },
    "debug_analysis": {
        "overall_code_health": "healthy/has_issues/critical_issues",
        "debugging_priority": ["Most critical issues to fix first"],
        "fixed_code": "Complete corrected version of the code",
        "explanation_of_fixes": "Explanation of every change made",
        "testing_suggestions": ["How to test the fixed code"]
    },
    "code_review": {
        "overall_rating": 8,
        "code_quality": {"rating": 7, "assessment": "Quality assessment after considering errors"},
        "readability": {"rating": 8, "assessment": "Readability assessment"},
        "maintainability": {"rating": 7, "assessment": "Maintainability assessment"},
        "line_by_line_analysis": [
            {
                "line_number": "Line number",
                "line_content": "Line content",
                "quality_score": "1-10 rating for this line",
                "issues": ["Issues with this line"],
                "suggestions": ["Improvements for this line"],
                "complexity_note": "Complexity impact of this line"
            }
        ]
    },
    "security_analysis": {
        "vulnerabilities": ["Security issues found"],
        "recommendations": ["Security improvements"]
    },
    "performance_analysis": {
        "bottlenecks": ["Performance issues with line numbers"],
        "optimizations": ["Concrete performance improvements"],
        "time_complexity": {
            "overall": "O(n), O(n^2), etc.",
            "breakdown": [
                {"function_name": "function name", "lines": "line range (e.g., 5-10)", "complexity": "O(n)", "explanation": "Why this complexity"}
            ]
        },
        "space_complexity": {
            "overall": "O(1), O(n), etc.",
            "breakdown": [
                {"component": "data structure or variable", "lines": "line range", "complexity": "O(n)", "explanation": "Memory usage"}
            ]
        },
        "complexity_analysis": {
            "best_case": "Best case complexity",
            "average_case": "Average case complexity",
            "worst_case": "Worst case complexity",
            "scalability_notes": "How the code scales with input size"
        }
    },
    "improvement_suggestions": {
        "best_practices": ["Best practice recommendations"],
        "refactoring": ["Refactoring suggestions"],
        "modern_features": ["Modern language features to use"]
    },
    "summary": {
        "error_status": "error-free/has-errors/critical-errors",
        "main_issues": ["Top 3 most important issues"],
        "strengths": ["Code strengths"],
        "priority_fixes": ["Most important fixes in order"],
        "overall_score": 8
    }
}"#;

const QUICK_DEBUG_TEMPLATE: &str = r#"Quick debug for {{LANGUAGE}}:

```{{LANGUAGE}}
{{CODE}}
```

Error: {{ERROR}}

Answer with a single brief JSON object and nothing else:
{
    "issue_explanation": "Brief issue description",
    "fixed_code": "Key fixes only",
    "fix_explanation": "Short explanation",
    "prevention_tips": ["Top 2 tips"]
}"#;
