//! 提醒计划
//!
//! 计划由 `"3d"`、`"12h"`、`"1d12h"` 这样的偏移量组成，表示截止时间之前多久提醒。
//! 内部统一换算成分钟。

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_ENTRIES: usize = 10;
pub const MAX_OFFSET_MINUTES: i64 = 60 * 24 * 60;

static OFFSET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d{1,5})d)?(?:(\d{1,7})h)?$").expect("Invalid reminder offset regex")
});

/// 规范化后的提醒计划，偏移量去重并按从大到小排列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderSchedule {
    offsets: Vec<i64>,
}

/// 解析单个偏移量，返回分钟数
pub fn parse_offset(raw: &str) -> Result<i64, String> {
    let value = raw.trim().to_ascii_lowercase();
    let caps = OFFSET_RE
        .captures(&value)
        .filter(|_| !value.is_empty())
        .ok_or_else(|| format!("无效的提醒偏移量 '{raw}'，格式如 3d、12h、1d12h"))?;

    let number = |idx: usize| -> i64 {
        caps.get(idx)
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .unwrap_or(0)
    };
    let minutes = number(1) * 24 * 60 + number(2) * 60;

    if minutes <= 0 {
        return Err(format!("提醒偏移量 '{raw}' 必须大于 0"));
    }
    if minutes > MAX_OFFSET_MINUTES {
        return Err(format!("提醒偏移量 '{raw}' 不能超过 60 天"));
    }
    Ok(minutes)
}

/// 分钟数转回规范写法
pub fn format_offset(minutes: i64) -> String {
    let hours = minutes / 60;
    match (hours / 24, hours % 24) {
        (0, h) => format!("{h}h"),
        (d, 0) => format!("{d}d"),
        (d, h) => format!("{d}d{h}h"),
    }
}

impl ReminderSchedule {
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self, String> {
        let mut offsets = entries
            .iter()
            .map(|entry| parse_offset(entry.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        offsets.sort_unstable_by(|a, b| b.cmp(a));
        offsets.dedup();

        if offsets.len() > MAX_ENTRIES {
            return Err(format!("提醒计划最多 {MAX_ENTRIES} 项"));
        }
        Ok(Self { offsets })
    }

    /// 已存储的计划按同样规则解析，无效项跳过
    pub fn parse_lenient<S: AsRef<str>>(entries: &[S]) -> Self {
        let mut offsets: Vec<i64> = entries
            .iter()
            .filter_map(|entry| parse_offset(entry.as_ref()).ok())
            .collect();
        offsets.sort_unstable_by(|a, b| b.cmp(a));
        offsets.dedup();
        offsets.truncate(MAX_ENTRIES);
        Self { offsets }
    }

    pub fn offsets(&self) -> &[i64] {
        &self.offsets
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.offsets.iter().map(|m| format_offset(*m)).collect()
    }

    /// 当前应发送的偏移量
    ///
    /// 触发时间 `deadline - offset` 已到且晚于提交创建时间的偏移量中取最小的一个；
    /// 截止后不再提醒。
    pub fn due_offset(
        &self,
        deadline: DateTime<Utc>,
        created_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Option<i64> {
        if now >= deadline {
            return None;
        }
        self.offsets
            .iter()
            .copied()
            .filter(|offset| {
                let trigger = deadline - Duration::minutes(*offset);
                trigger <= now && trigger > created_at
            })
            .min()
    }
}

/// 表单显式计划优先，其次学校默认计划，最后全局默认
pub fn resolve_schedule(
    requested: Option<&[String]>,
    school_default: Option<&[String]>,
    global_default: &[String],
) -> Result<ReminderSchedule, String> {
    match (requested, school_default) {
        (Some(entries), _) => ReminderSchedule::parse(entries),
        (None, Some(entries)) => Ok(ReminderSchedule::parse_lenient(entries)),
        (None, None) => Ok(ReminderSchedule::parse_lenient(global_default)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, hour, 0, 0).single().expect("valid time")
    }

    #[test]
    fn test_parse_offset_forms() {
        assert_eq!(parse_offset("3d"), Ok(3 * 24 * 60));
        assert_eq!(parse_offset("12h"), Ok(12 * 60));
        assert_eq!(parse_offset(" 1D12h "), Ok(36 * 60));
        assert!(parse_offset("").is_err());
        assert!(parse_offset("0d").is_err());
        assert!(parse_offset("3 days").is_err());
        assert!(parse_offset("12h3d").is_err());
        assert!(parse_offset("61d").is_err());
        assert_eq!(parse_offset("60d"), Ok(MAX_OFFSET_MINUTES));
    }

    #[test]
    fn test_schedule_normalizes_order_and_duplicates() {
        let schedule = ReminderSchedule::parse(&["1d", "3d", "24h", "12h"]).expect("valid");
        assert_eq!(schedule.offsets(), &[3 * 1440, 1440, 720]);
        assert_eq!(schedule.to_strings(), vec!["3d", "1d", "12h"]);
    }

    #[test]
    fn test_schedule_limits_entries() {
        let entries: Vec<String> = (1..=11).map(|d| format!("{d}d")).collect();
        assert!(ReminderSchedule::parse(&entries).is_err());
        assert!(ReminderSchedule::parse(&entries[..10]).is_ok());
    }

    #[test]
    fn test_format_offset_mixed() {
        assert_eq!(format_offset(36 * 60), "1d12h");
        assert_eq!(format_offset(5 * 60), "5h");
    }

    #[test]
    fn test_due_offset_picks_most_recent_trigger() {
        // 截止 5/12 00:00，计划 3d / 1d / 12h
        let deadline = Utc.with_ymd_and_hms(2026, 5, 12, 0, 0, 0).single().expect("valid");
        let created = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).single().expect("valid");
        let schedule = ReminderSchedule::parse(&["3d", "1d", "12h"]).expect("valid");

        // 5/10 12:00 时 3d 已过、1d 未到
        assert_eq!(schedule.due_offset(deadline, created, at(12)), Some(3 * 1440));

        // 5/11 13:00 时 3d、1d、12h 都已触发，只取 12h
        let late = Utc.with_ymd_and_hms(2026, 5, 11, 13, 0, 0).single().expect("valid");
        assert_eq!(schedule.due_offset(deadline, created, late), Some(720));
    }

    #[test]
    fn test_due_offset_ignores_triggers_before_distribution() {
        let deadline = Utc.with_ymd_and_hms(2026, 5, 12, 0, 0, 0).single().expect("valid");
        // 在 3d 触发点之后才分发
        let created = at(6);
        let schedule = ReminderSchedule::parse(&["3d", "1d"]).expect("valid");
        assert_eq!(schedule.due_offset(deadline, created, at(12)), None);

        let later = Utc.with_ymd_and_hms(2026, 5, 11, 1, 0, 0).single().expect("valid");
        assert_eq!(schedule.due_offset(deadline, created, later), Some(1440));
    }

    #[test]
    fn test_nothing_due_after_deadline() {
        let deadline = at(12);
        let schedule = ReminderSchedule::parse(&["1h"]).expect("valid");
        assert_eq!(schedule.due_offset(deadline, at(0), at(12)), None);
        assert_eq!(schedule.due_offset(deadline, at(0), at(11)), Some(60));
    }

    #[test]
    fn test_resolve_schedule_fallbacks() {
        let global = vec!["3d".to_string(), "1d".to_string()];
        let school = vec!["2d".to_string()];

        let explicit = vec!["6h".to_string()];
        assert_eq!(
            resolve_schedule(Some(explicit.as_slice()), Some(school.as_slice()), &global).map(|s| s.to_strings()),
            Ok(vec!["6h".to_string()])
        );
        assert_eq!(
            resolve_schedule(None, Some(school.as_slice()), &global).map(|s| s.to_strings()),
            Ok(vec!["2d".to_string()])
        );
        assert_eq!(
            resolve_schedule(None, None, &global).map(|s| s.to_strings()),
            Ok(global.clone())
        );
        let bad = vec!["bad".to_string()];
        assert!(resolve_schedule(Some(bad.as_slice()), None, &global).is_err());
    }
}
