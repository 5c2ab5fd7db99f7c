// Paw Voice Engine — App name corrections
// Static misspelling table for app-launch requests. Lookup is exact-string on
// the whole (lowercased, space-joined) app name; no fuzzy logic here.

/// (heard, canonical) pairs. Keys must be lowercase.
pub const APP_NAME_CORRECTIONS: &[(&str, &str)] = &[
    // ── Messaging ──
    ("whatsap", "whatsapp"),
    ("watsapp", "whatsapp"),
    ("whats app", "whatsapp"),
    ("what's app", "whatsapp"),
    ("whatapp", "whatsapp"),
    ("telegam", "telegram"),
    ("telegramm", "telegram"),
    ("mesages", "messages"),
    ("massages", "messages"),
    ("text messages", "messages"),
    ("sms", "messages"),
    ("g mail", "gmail"),
    ("gmale", "gmail"),
    ("e mail", "email"),
    ("signal app", "signal"),
    // ── Social ──
    ("fb", "facebook"),
    ("facebok", "facebook"),
    ("face book", "facebook"),
    ("insta", "instagram"),
    ("instagam", "instagram"),
    ("instagramm", "instagram"),
    ("tik tok", "tiktok"),
    ("tic toc", "tiktok"),
    ("twiter", "twitter"),
    ("snap chat", "snapchat"),
    // ── Media ──
    ("you tube", "youtube"),
    ("youtub", "youtube"),
    ("utube", "youtube"),
    ("spotfy", "spotify"),
    ("spotifi", "spotify"),
    ("net flix", "netflix"),
    ("netflex", "netflix"),
    ("galery", "gallery"),
    ("photo gallery", "gallery"),
    // ── Utilities ──
    ("calender", "calendar"),
    ("calculater", "calculator"),
    ("calc", "calculator"),
    ("settngs", "settings"),
    ("setting", "settings"),
    ("map", "maps"),
    ("google map", "google maps"),
    ("chrom", "chrome"),
    ("google chrome", "chrome"),
    ("playstore", "play store"),
    ("file manager", "files"),
    ("my files", "files"),
];

/// Canonical name for `name`, or `name` itself when the table has no entry.
pub fn correct_app_name(name: &str) -> String {
    APP_NAME_CORRECTIONS
        .iter()
        .find(|(heard, _)| *heard == name)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| name.to_string())
}
