use std::fmt::Write;

use super::components::toast;
use super::escape;
use crate::flash::Toast;

pub const DEFAULT_TITLE: &str = "Bunko";

const NAV_ITEMS: &[(&str, &str, &str)] = &[
    ("Home", "🏠", "/dashboard"),
    ("Dictionary", "📖", "/dictionary"),
];

const STYLES: &str = r#"
:root{--sakura:#e86a92;--sakura-soft:#fde7ee;--bg:#fff8fa;--card:#fff;--muted:#8a7f86;--border:#f1d9e1;--success:#2f9e6f;--warning:#d9951a;--danger:#d64545}
*{box-sizing:border-box}
body{margin:0;font-family:"Hiragino Sans","Noto Sans JP",system-ui,sans-serif;background:linear-gradient(180deg,var(--bg),#fff);color:#2b2228;min-height:100vh}
header.app-header{position:fixed;top:0;left:0;right:0;z-index:50;background:rgba(255,255,255,.85);backdrop-filter:blur(6px);border-bottom:1px solid var(--border);display:flex;align-items:center;padding:1rem}
header.app-header h1{flex:1;text-align:center;font-size:1.2rem;margin:0}
main{max-width:28rem;margin:0 auto;padding:5rem 1rem 6rem}
nav.bottom-nav{position:fixed;bottom:0;left:0;right:0;z-index:50;background:var(--card);border-top:1px solid var(--border);display:flex;justify-content:space-around;padding:.5rem}
nav.bottom-nav a{display:flex;flex-direction:column;align-items:center;gap:.2rem;color:var(--muted);text-decoration:none;font-size:.85rem}
nav.bottom-nav a.active{color:var(--sakura);font-weight:700}
.card{background:var(--card);border:1px solid var(--border);border-radius:.9rem;padding:1rem;margin-bottom:.6rem;position:relative}
.stats{display:grid;grid-template-columns:1fr 1fr;gap:.75rem}
.stat{text-align:center}.stat .value{font-size:1.5rem;font-weight:700}.stat .label{font-size:.85rem;color:var(--muted)}
.stat.highlight{background:linear-gradient(135deg,var(--sakura),#f4a3bd);color:#fff}.stat.highlight .label{color:#fff}
.btn{display:inline-block;border:0;border-radius:.6rem;padding:.7rem 1rem;background:var(--sakura);color:#fff;font-size:1rem;cursor:pointer;text-decoration:none;text-align:center}
.btn.block{display:block;width:100%}.btn.outline{background:transparent;color:var(--sakura);border:1px solid var(--sakura)}.btn.small{padding:.25rem .6rem;font-size:.8rem}
.muted{color:var(--muted)}.center{text-align:center}
.badge{display:inline-block;border-radius:999px;padding:.1rem .55rem;font-size:.75rem;background:var(--sakura-soft);margin:0 .2rem .2rem 0}
.mastery-new{background:#eee;color:#666}.mastery-learning{background:#fff4df;color:var(--warning)}.mastery-mastered{background:#e3f6ee;color:var(--success)}
label{display:block;font-size:.9rem;margin:.6rem 0 .25rem}
input,textarea{width:100%;padding:.6rem;border:1px solid var(--border);border-radius:.5rem;font-size:1rem}
.toast{border-radius:.7rem;padding:.8rem 1rem;margin-bottom:1rem;border:1px solid var(--border);background:var(--card)}
.toast.destructive{border-color:var(--danger);color:var(--danger)}
.tabs{display:grid;grid-template-columns:1fr 1fr;gap:.4rem;margin-bottom:1rem}
.tabs a{text-align:center;padding:.5rem;border-radius:.5rem;text-decoration:none;color:var(--muted);background:var(--sakura-soft)}
.tabs a.active{background:var(--sakura);color:#fff}
.delete{position:absolute;top:.4rem;right:.4rem;background:none;border:0;color:var(--muted);cursor:pointer;font-size:1rem}
.delete:hover{color:var(--danger)}
.row{display:flex;gap:.5rem}.row>*{flex:1}
.spinner{width:2rem;height:2rem;border:3px solid var(--sakura-soft);border-top-color:var(--sakura);border-radius:50%;animation:spin 1s linear infinite;margin:40vh auto}
@keyframes spin{to{transform:rotate(360deg)}}
"#;

/// Frame options for [`mobile_layout`].
#[derive(Default)]
pub struct Frame<'a> {
    pub title: Option<&'a str>,
    pub active_path: Option<&'a str>,
    pub toast: Option<&'a Toast>,
    pub show_sign_out: bool,
    pub show_header: bool,
    pub show_nav: bool,
}

impl<'a> Frame<'a> {
    pub fn app(title: Option<&'a str>, active_path: Option<&'a str>) -> Self {
        Self {
            title,
            active_path,
            show_header: true,
            show_nav: true,
            ..Self::default()
        }
    }

    pub fn with_toast(mut self, toast: Option<&'a Toast>) -> Self {
        self.toast = toast;
        self
    }

    pub fn with_sign_out(mut self) -> Self {
        self.show_sign_out = true;
        self
    }
}

pub fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"ja\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{}</title><style>{STYLES}</style></head><body>{body}</body></html>",
        escape(title)
    )
}

pub fn mobile_layout(frame: &Frame<'_>, content: &str) -> String {
    let title = frame.title.unwrap_or(DEFAULT_TITLE);
    let mut body = String::new();

    if frame.show_header {
        body.push_str("<header class=\"app-header\">");
        let _ = write!(body, "<h1>{}</h1>", escape(title));
        if frame.show_sign_out {
            body.push_str(
                "<form method=\"post\" action=\"/auth/signout\">\
                 <button class=\"btn outline small\" type=\"submit\" title=\"Sign out\">Sign out</button></form>",
            );
        }
        body.push_str("</header>");
    }

    body.push_str("<main>");
    if let Some(pending) = frame.toast {
        body.push_str(&toast(pending));
    }
    body.push_str(content);
    body.push_str("</main>");

    if frame.show_nav {
        body.push_str(&bottom_nav(frame.active_path));
    }

    document(title, &body)
}

pub fn bottom_nav(active_path: Option<&str>) -> String {
    let mut nav = String::from("<nav class=\"bottom-nav\">");
    for (label, icon, path) in NAV_ITEMS {
        let class = if active_path == Some(*path) { " class=\"active\"" } else { "" };
        let _ = write!(nav, "<a href=\"{path}\"{class}><span>{icon}</span>{label}</a>");
    }
    nav.push_str("</nav>");
    nav
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bottom_nav_marks_active_item() {
        let nav = bottom_nav(Some("/dictionary"));
        assert!(nav.contains("<a href=\"/dictionary\" class=\"active\">"));
        assert!(nav.contains("<a href=\"/dashboard\"><span>"));
    }

    #[test]
    fn test_layout_uses_default_title() {
        let html = mobile_layout(&Frame::app(None, None), "<p>x</p>");
        assert!(html.contains("<h1>Bunko</h1>"));
        assert!(!html.contains("/auth/signout"));
    }
}
