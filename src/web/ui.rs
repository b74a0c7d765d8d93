//! HTML rendering for the upload page.

use std::fmt::Write;

use crate::document::record::format_timestamp;
use crate::document::DocumentPage;
use crate::web::csrf::CSRF_FIELD;

/// Flash message shown at the top of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub message: String,
    pub success: bool,
}

impl Flash {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }

    /// Decode a `msg` query code set by a redirect.
    pub fn from_code(code: &str) -> Option<Self> {
        let (message, success) = match code {
            "ok" => ("Document uploaded successfully.", true),
            "deleted" => ("Document deleted.", true),
            "err" => ("Upload failed. Please try again.", false),
            "del_err" => ("Delete failed. Please try again.", false),
            _ => return None,
        };
        Some(Self {
            message: message.to_string(),
            success,
        })
    }
}

/// Escape text for HTML element content and quoted attributes.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

/// Total number of pages, at least one.
pub fn total_pages(total: u64, page_size: u32) -> u64 {
    total.div_ceil(u64::from(page_size.max(1))).max(1)
}

/// Render the index page.
pub fn render_index(
    page: &DocumentPage,
    csrf_token: &str,
    flash: Option<&Flash>,
    allowed_extensions: &[String],
    max_upload_size: u64,
) -> String {
    let token = html_escape(csrf_token);
    let pages = total_pages(page.total, page.page_size);
    let accept = html_escape(&allowed_extensions.join(","));

    let mut html = String::new();
    html.push_str(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Documents</title>\n<style>\n\
         body{font-family:sans-serif;max-width:960px;margin:2rem auto;padding:0 1rem}\n\
         table{border-collapse:collapse;width:100%}\n\
         th,td{border-bottom:1px solid #ddd;padding:.4rem;text-align:left}\n\
         .flash{padding:.6rem;margin-bottom:1rem;border-radius:4px}\n\
         .ok{background:#e6f4ea}.error{background:#fce8e6}\n\
         </style>\n</head>\n<body>\n<h1>Documents</h1>\n",
    );

    if let Some(flash) = flash {
        let class = if flash.success { "ok" } else { "error" };
        let _ = writeln!(
            html,
            "<div class=\"flash {class}\">{}</div>",
            html_escape(&flash.message)
        );
    }

    let _ = writeln!(
        html,
        "<form method=\"post\" action=\"/\" enctype=\"multipart/form-data\">\n\
         <input type=\"hidden\" name=\"{CSRF_FIELD}\" value=\"{token}\">\n\
         <input type=\"file\" name=\"file\" accept=\"{accept}\" required>\n\
         <button type=\"submit\">Upload</button>\n\
         <small>Allowed: {accept}. Max {}.</small>\n</form>",
        human_size(max_upload_size)
    );

    if page.documents.is_empty() {
        html.push_str("<p>No documents.</p>\n");
    } else {
        html.push_str(
            "<table>\n<thead><tr><th>ID</th><th>Filename</th><th>Size</th>\
             <th>Type</th><th>Uploaded</th><th></th></tr></thead>\n<tbody>\n",
        );
        for doc in &page.documents {
            let _ = writeln!(
                html,
                "<tr><td>{id}</td>\
                 <td><a href=\"/download/{id}\">{name}</a></td>\
                 <td>{size}</td><td>{ctype}</td><td>{ts}</td>\
                 <td><form method=\"post\" action=\"/delete/{id}\">\
                 <input type=\"hidden\" name=\"{CSRF_FIELD}\" value=\"{token}\">\
                 <button type=\"submit\">Delete</button></form></td></tr>",
                id = doc.id,
                name = html_escape(&doc.filename),
                size = human_size(doc.size),
                ctype = html_escape(&doc.content_type),
                ts = html_escape(&format_timestamp(&doc.upload_timestamp)),
            );
        }
        html.push_str("</tbody>\n</table>\n");
    }

    let _ = write!(
        html,
        "<nav><span>Page {} of {pages} ({} documents)</span>",
        page.page, page.total
    );
    if page.page > 1 {
        let _ = write!(
            html,
            " <a href=\"/?page={}&amp;page_size={}\">Previous</a>",
            page.page - 1,
            page.page_size
        );
    }
    if u64::from(page.page) < pages {
        let _ = write!(
            html,
            " <a href=\"/?page={}&amp;page_size={}\">Next</a>",
            page.page + 1,
            page.page_size
        );
    }
    html.push_str("</nav>\n</body>\n</html>\n");

    html
}
