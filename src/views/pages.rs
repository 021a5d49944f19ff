use std::fmt::Write;

use super::components::{progress_stats, word_card};
use super::escape;
use super::layout::{document, mobile_layout, Frame};
use crate::flash::Toast;
use crate::vocab::form::MIN_PASSWORD_LEN;
use crate::vocab::{ProgressStats, SyllabaryIndex, Word, WordDraft};

/// Number of today's words previewed on the dashboard.
pub const TODAY_PREVIEW_LIMIT: usize = 3;

pub const OTHER_GROUP_LABEL: &str = "Other";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthTab {
    #[default]
    SignIn,
    SignUp,
}

impl AuthTab {
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw {
            Some("signup") => AuthTab::SignUp,
            _ => AuthTab::SignIn,
        }
    }
}

pub fn loading_page() -> String {
    document(
        "Bunko",
        "<meta http-equiv=\"refresh\" content=\"1\"><div class=\"spinner\" aria-label=\"Loading\"></div>",
    )
}

pub fn landing_page() -> String {
    let body = "<main class=\"center\">\
        <h1>Japanese Learning App</h1>\
        <p class=\"muted\">Learn Japanese efficiently</p>\
        <div class=\"card\">\
        <div style=\"font-size:3.5rem\">🌸</div>\
        <h2>Start Learning</h2>\
        <p class=\"muted\">Create an account to begin your Japanese learning journey</p>\
        <a class=\"btn block\" href=\"/auth\">Get Started</a>\
        </div></main>";
    document("Japanese Learning App", body)
}

pub fn auth_page(tab: AuthTab, email: &str, toast: Option<&Toast>) -> String {
    let email = escape(email);
    let (signin_class, signup_class) = match tab {
        AuthTab::SignIn => (" class=\"active\"", ""),
        AuthTab::SignUp => ("", " class=\"active\""),
    };
    let (signin_hidden, signup_hidden) = match tab {
        AuthTab::SignIn => ("", " hidden"),
        AuthTab::SignUp => (" hidden", ""),
    };

    let mut content = String::from(
        "<div class=\"center\"><div style=\"font-size:3.5rem\">🌸</div>\
         <h2>おかえりなさい</h2><p class=\"muted\">日本語学習の旅を始めましょう</p></div>",
    );
    content.push_str("<div class=\"card\">");
    let _ = write!(
        content,
        "<div class=\"tabs\"><a href=\"/auth?tab=signin\"{signin_class}>ログイン</a>\
         <a href=\"/auth?tab=signup\"{signup_class}>新規登録</a></div>"
    );
    let _ = write!(
        content,
        "<form id=\"signin\" method=\"post\" action=\"/auth/signin\"{signin_hidden}>\
         <label for=\"signin-email\">メールアドレス</label>\
         <input id=\"signin-email\" name=\"email\" type=\"email\" value=\"{email}\" placeholder=\"your.email@example.com\" required>\
         <label for=\"signin-password\">パスワード</label>\
         <input id=\"signin-password\" name=\"password\" type=\"password\" placeholder=\"••••••••\" required>\
         <p><button class=\"btn block\" type=\"submit\">ログイン</button></p></form>"
    );
    let _ = write!(
        content,
        "<form id=\"signup\" method=\"post\" action=\"/auth/signup\"{signup_hidden}>\
         <label for=\"signup-email\">メールアドレス</label>\
         <input id=\"signup-email\" name=\"email\" type=\"email\" value=\"{email}\" placeholder=\"your.email@example.com\" required>\
         <label for=\"signup-password\">パスワード</label>\
         <input id=\"signup-password\" name=\"password\" type=\"password\" placeholder=\"••••••••\" minlength=\"{MIN_PASSWORD_LEN}\" required>\
         <p class=\"muted\">{MIN_PASSWORD_LEN}文字以上のパスワードを設定してください</p>\
         <p><button class=\"btn block\" type=\"submit\">アカウント作成</button></p></form>"
    );
    content.push_str("</div>");
    content.push_str(
        "<p class=\"muted center\">アカウントを作成することで、あなたの学習進度が保存されます</p>",
    );

    let frame = Frame {
        title: Some("🌸 Bunko"),
        show_header: true,
        toast,
        ..Frame::default()
    };
    mobile_layout(&frame, &content)
}

pub struct DashboardView<'a> {
    pub stats: ProgressStats,
    pub today: &'a [Word],
    pub has_words: bool,
    pub toast: Option<&'a Toast>,
}

pub fn dashboard_page(view: &DashboardView<'_>) -> String {
    let mut content = String::from(
        "<div class=\"center\"><h2>Welcome back!</h2>\
         <p class=\"muted\">Let's learn Japanese today</p></div>",
    );
    content.push_str(&progress_stats(&view.stats));
    content.push_str("<p><a class=\"btn block\" href=\"/dashboard/new\">＋ Add New Word</a></p>");

    if !view.today.is_empty() {
        content.push_str("<section><h3>📖 Today's Words</h3>");
        for word in view.today.iter().take(TODAY_PREVIEW_LIMIT) {
            content.push_str(&word_card(word, ""));
        }
        content.push_str("</section>");
    }

    if !view.has_words {
        content.push_str(
            "<div class=\"card center empty\"><div style=\"font-size:3.5rem\">🌸</div>\
             <h3>Let's get started!</h3>\
             <p class=\"muted\">Add your first Japanese word to begin your learning journey.</p></div>",
        );
    }

    let frame = Frame::app(None, Some("/dashboard"))
        .with_toast(view.toast)
        .with_sign_out();
    mobile_layout(&frame, &content)
}

pub fn add_word_page(draft: &WordDraft, toast: Option<&Toast>) -> String {
    let mut content = String::from("<form class=\"card\" method=\"post\" action=\"/dashboard/new\">");
    let _ = write!(
        content,
        "<label for=\"word\">Word *</label>\
         <input id=\"word\" name=\"word\" value=\"{}\" placeholder=\"e.g. 今日は\" autofocus>\
         <label for=\"reading\">Reading</label>\
         <input id=\"reading\" name=\"reading\" value=\"{}\" placeholder=\"e.g. こんにちは, konnichiwa\">\
         <label for=\"meaning\">Meaning</label>\
         <textarea id=\"meaning\" name=\"meaning\" rows=\"2\" placeholder=\"e.g. Hello, good afternoon\">{}</textarea>",
        escape(&draft.word),
        escape(&draft.reading),
        escape(&draft.meaning)
    );

    content.push_str("<label>Tags</label><div class=\"selected-tags\">");
    for tag in &draft.tags {
        let tag = escape(tag);
        let _ = write!(
            content,
            "<input type=\"hidden\" name=\"tags\" value=\"{tag}\">\
             <span class=\"badge\">{tag} <button class=\"btn small outline\" type=\"submit\" name=\"remove_tag\" value=\"{tag}\" formnovalidate>×</button></span>"
        );
    }
    content.push_str("</div><div class=\"common-tags\">");
    for tag in draft.available_common_tags() {
        let tag = escape(tag);
        let _ = write!(
            content,
            "<button class=\"btn small outline\" type=\"submit\" name=\"add_tag\" value=\"{tag}\" formnovalidate>{tag}</button> "
        );
    }
    content.push_str(
        "</div><div class=\"row\">\
         <input name=\"custom_tag\" placeholder=\"Custom Tags\">\
         <button class=\"btn small outline\" type=\"submit\" name=\"add_custom_tag\" value=\"1\" formnovalidate>＋</button>\
         </div>\
         <div class=\"row\" style=\"margin-top:1rem\">\
         <a class=\"btn outline\" href=\"/dashboard\">Cancel</a>\
         <button class=\"btn\" type=\"submit\">Save</button></div></form>",
    );

    let frame = Frame::app(Some("Add New Word"), Some("/dashboard"))
        .with_toast(toast)
        .with_sign_out();
    mobile_layout(&frame, &content)
}

fn delete_button(word: &Word) -> String {
    format!(
        "<form method=\"post\" action=\"/dictionary/{}/delete\">\
         <button class=\"delete\" type=\"submit\" title=\"Delete\">🗑</button></form>",
        escape(&word.id)
    )
}

fn word_section(label: &str, words: &[Word], html: &mut String) {
    let _ = write!(html, "<section class=\"group\"><h2>{}</h2>", escape(label));
    if words.is_empty() {
        html.push_str("<p class=\"muted\">No words in this group.</p>");
    } else {
        for word in words {
            html.push_str(&word_card(word, &delete_button(word)));
        }
    }
    html.push_str("</section>");
}

pub fn dictionary_page(index: &SyllabaryIndex, toast: Option<&Toast>) -> String {
    let mut content = String::new();
    for bucket in &index.groups {
        word_section(bucket.label, &bucket.words, &mut content);
    }
    if !index.unplaced.is_empty() {
        word_section(OTHER_GROUP_LABEL, &index.unplaced, &mut content);
    }

    let frame = Frame::app(Some("Dictionary"), Some("/dictionary"))
        .with_toast(toast)
        .with_sign_out();
    mobile_layout(&frame, &content)
}

pub fn not_found_page() -> String {
    let content = "<div class=\"card center\"><h2>404</h2>\
        <p class=\"muted\">Oops! Page not found</p>\
        <a class=\"btn\" href=\"/\">Return to Home</a></div>";
    mobile_layout(&Frame::app(Some("Not Found"), None), content)
}
