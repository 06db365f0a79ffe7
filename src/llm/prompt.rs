use chrono::{Datelike, NaiveDate, Weekday};

/// System policy prompt, embedded at compile time.
const SYSTEM_TEMPLATE: &str = include_str!("../../prompts/system_zh.txt");

/// System prompt stamped with today's local date.
pub fn system_prompt() -> String {
    system_prompt_for(chrono::Local::now().date_naive())
}

pub fn system_prompt_for(date: NaiveDate) -> String {
    SYSTEM_TEMPLATE.replace("{date}", &format_date_zh(date))
}

/// `2026年10月16日 星期五`
pub fn format_date_zh(date: NaiveDate) -> String {
    let weekday = match date.weekday() {
        Weekday::Mon => "星期一",
        Weekday::Tue => "星期二",
        Weekday::Wed => "星期三",
        Weekday::Thu => "星期四",
        Weekday::Fri => "星期五",
        Weekday::Sat => "星期六",
        Weekday::Sun => "星期日",
    };
    format!("{} {}", date.format("%Y年%m月%d日"), weekday)
}

/// Screen descriptor as sent to the model.
pub fn screen_info(current_app: &str) -> String {
    serde_json::json!({ "current_app": current_app }).to_string()
}

/// Text of the first user turn: the instruction plus the screen descriptor.
pub fn first_turn_text(instruction: &str, current_app: &str) -> String {
    format!("{instruction}\n\n{}", screen_info(current_app))
}

/// Text of every later user turn.
pub fn followup_turn_text(current_app: &str) -> String {
    format!("** Screen Info **\n\n{}", screen_info(current_app))
}
