//! Server-rendered HTML for the upload form and the result page

use std::fmt::Write;

use crate::types::{LanguageCatalog, ProcessResponse, DEFAULT_TARGET_LANGUAGE};

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; max-width: 760px; margin: 2rem auto; padding: 0 1rem; color: #222; }
h1 { font-size: 1.6rem; }
fieldset { border: 1px solid #ddd; border-radius: 6px; margin: 1rem 0; padding: 0.8rem 1rem; }
label { display: block; margin: 0.3rem 0; }
textarea { width: 100%; min-height: 4rem; font-family: monospace; }
button { padding: 0.5rem 1.4rem; font-size: 1rem; }
.summary { white-space: pre-wrap; background: #f7f7f7; padding: 1rem; border-radius: 6px; }
.error { color: #b00020; }
"#;

/// Escape text for HTML element content and attribute values
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        html_escape(title),
        STYLE,
        body
    )
}

/// Upload form
pub fn index_page(languages: &LanguageCatalog) -> String {
    let mut options = String::new();
    for language in languages.languages() {
        let selected = if language.code == DEFAULT_TARGET_LANGUAGE {
            " selected"
        } else {
            ""
        };
        let _ = writeln!(
            options,
            "<option value=\"{}\"{}>{} ({})</option>",
            html_escape(&language.name),
            selected,
            html_escape(&language.name),
            html_escape(&language.code)
        );
    }

    let body = format!(
        r#"<h1>PDF Translator</h1>
<form method="post" action="/" enctype="multipart/form-data">
<fieldset>
<legend>Document</legend>
<input type="file" name="file" accept=".pdf,application/pdf" required>
</fieldset>
<fieldset>
<legend>Target language</legend>
<select name="target_language">
{options}</select>
</fieldset>
<fieldset>
<legend>Outputs</legend>
<label><input type="checkbox" name="outputs" value="json"> JSON extraction</label>
<label><input type="checkbox" name="outputs" value="pdf"> Translated PDF</label>
<label><input type="checkbox" name="outputs" value="summary"> Summary</label>
<label>Summary format
<select name="summary_format">
<option value="txt" selected>Text (.txt)</option>
<option value="pdf">PDF (.pdf)</option>
</select></label>
</fieldset>
<fieldset>
<legend>Custom instructions (optional, placeholders: {{text}}, {{target_language}})</legend>
<label>JSON<textarea name="custom_json_instructions"></textarea></label>
<label>Translated PDF<textarea name="custom_pdf_instructions"></textarea></label>
<label>Summary<textarea name="custom_summary_instructions"></textarea></label>
</fieldset>
<button type="submit">Process</button>
</form>"#,
        options = options
    );

    layout("PDF Translator", &body)
}

/// Result page after processing
pub fn result_page(response: &ProcessResponse) -> String {
    let mut body = String::from("<h1>Results</h1>\n");
    let _ = writeln!(
        body,
        "<p><strong>Detected language:</strong> {}</p>\n<p><strong>Confidence:</strong> {}</p>",
        html_escape(response.language_display()),
        html_escape(&response.confidence_display())
    );

    if let Some(summary) = &response.summary {
        let _ = writeln!(
            body,
            "<h2>Summary</h2>\n<div class=\"summary\">{}</div>",
            html_escape(summary)
        );
    }

    body.push_str("<h2>Files</h2>\n");
    if response.files.is_empty() {
        body.push_str("<p>No files generated.</p>\n");
    } else {
        body.push_str("<ul>\n");
        for file in &response.files {
            match (&file.filename, &file.error) {
                (Some(name), _) => {
                    let _ = writeln!(
                        body,
                        "<li>{}: <a href=\"/download/{}\">{}</a></li>",
                        html_escape(&file.label),
                        html_escape(name),
                        html_escape(name)
                    );
                }
                (None, error) => {
                    let _ = writeln!(
                        body,
                        "<li>{}: <span class=\"error\">{}</span></li>",
                        html_escape(&file.label),
                        html_escape(error.as_deref().unwrap_or("Processing failed"))
                    );
                }
            }
        }
        body.push_str("</ul>\n");
    }

    let _ = writeln!(
        body,
        "<p><small>Processed in {} ms</small></p>\n<p><a href=\"/\">Process another document</a></p>",
        response.processing_time_ms
    );

    layout("Results", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OutputFile;

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<a href='x'>&\"</a>"), "&lt;a href=&#39;x&#39;&gt;&amp;&quot;&lt;/a&gt;");
    }

    #[test]
    fn test_index_lists_languages() {
        let page = index_page(&LanguageCatalog::default());
        assert!(page.contains("<option value=\"English\" selected>English (en)</option>"));
        assert!(page.contains("name=\"custom_pdf_instructions\""));
        assert!(page.contains("{text}"));
    }

    #[test]
    fn test_result_page() {
        let response = ProcessResponse {
            summary: Some("<b>short</b>".to_string()),
            files: vec![
                OutputFile::ready("JSON Output", "a_output.json"),
                OutputFile::failed("Translated PDF", "PDF rebuild failed"),
            ],
            ..ProcessResponse::default()
        };
        let page = result_page(&response);

        assert!(page.contains("Unknown"));
        assert!(page.contains("N/A"));
        assert!(page.contains("&lt;b&gt;short&lt;/b&gt;"));
        assert!(page.contains("<a href=\"/download/a_output.json\">"));
        assert!(page.contains("PDF rebuild failed"));
    }

    #[test]
    fn test_result_page_without_files() {
        let page = result_page(&ProcessResponse::default());
        assert!(page.contains("No files generated."));
        assert!(!page.contains("<h2>Summary</h2>"));
    }
}
