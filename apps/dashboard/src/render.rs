//! Plain-text rendering of bot panels and notices.

use chrono::{DateTime, Local, Utc};
use client_core::{DashboardSnapshot, Notice, NoticeKind, SystemSummary};
use shared::domain::BotRecord;

pub fn render_summary(snapshot: &DashboardSnapshot) -> String {
    match snapshot.summary() {
        SystemSummary::AllOperational => "all bots are active and authenticated".to_string(),
        SystemSummary::NeedsAttention => "some bots need attention".to_string(),
    }
}

pub fn render_bot(bot: &BotRecord, now: DateTime<Utc>) -> String {
    let status = &bot.status;
    let mut lines = vec![format!(
        "{} [{}] {}",
        bot.display_name,
        bot.id,
        if status.is_authenticated {
            "authenticated"
        } else {
            "not authenticated"
        }
    )];
    lines.push(format!(
        "  state: {}",
        if status.is_ready { "ready" } else { "not ready" }
    ));
    if let Some(name) = &status.remote_display_name {
        lines.push(format!("  name: {name}"));
    }
    if let Some(account_id) = &status.account_id {
        lines.push(format!("  id: {account_id}"));
    }
    if let Some(raw) = &status.expires_at {
        let shown = status
            .expires_at_parsed()
            .map(|ts| {
                ts.with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_else(|| raw.clone());
        let marker = if status.session_expired_at(now) {
            " (expired)"
        } else {
            ""
        };
        lines.push(format!("  expires: {shown}{marker}"));
    }
    if let Some(err) = &status.last_error {
        lines.push(format!("  last error: {err}"));
    }
    lines.join("\n")
}

pub fn render_dashboard(snapshot: &DashboardSnapshot, now: DateTime<Utc>) -> String {
    let mut out = vec![render_summary(snapshot)];
    out.extend(snapshot.bots.iter().map(|bot| render_bot(bot, now)));
    out.join("\n")
}

pub fn render_notice(notice: &Notice) -> String {
    let tag = match notice.kind {
        NoticeKind::Success => "ok",
        NoticeKind::Error => "error",
        NoticeKind::Info => "info",
    };
    format!("[{tag}] {}", notice.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use shared::domain::BotStatus;

    fn snapshot(bots: Vec<BotRecord>) -> DashboardSnapshot {
        DashboardSnapshot {
            bots,
            revision: 1,
            last_applied_cycle: 1,
            submitting: false,
            username_input: String::new(),
        }
    }

    #[test]
    fn fresh_bot_renders_as_not_ready() {
        let text = render_bot(&BotRecord::new("bot1", "Bot 1"), Utc::now());
        assert!(text.contains("Bot 1 [bot1] not authenticated"));
        assert!(text.contains("state: not ready"));
        assert!(!text.contains("expires"));
    }

    #[test]
    fn past_expiry_is_marked() {
        let mut bot = BotRecord::new("bot1", "Bot 1");
        bot.status = BotStatus {
            is_ready: true,
            is_authenticated: true,
            expires_at: Some("2020-01-01T00:00:00Z".into()),
            account_id: Some("acc".into()),
            ..BotStatus::default()
        };
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).single().expect("ts");
        let text = render_bot(&bot, now);
        assert!(text.contains("(expired)"));
        assert!(text.contains("id: acc"));
    }

    #[test]
    fn unparseable_expiry_is_shown_raw() {
        let mut bot = BotRecord::new("bot1", "Bot 1");
        bot.status.expires_at = Some("soon".into());
        assert!(render_bot(&bot, Utc::now()).contains("expires: soon"));
    }

    #[test]
    fn summary_reflects_every_bot() {
        let mut ok = BotRecord::new("bot1", "Bot 1");
        ok.status.is_ready = true;
        ok.status.is_authenticated = true;
        assert_eq!(
            render_summary(&snapshot(vec![ok.clone()])),
            "all bots are active and authenticated"
        );
        assert_eq!(
            render_summary(&snapshot(vec![ok, BotRecord::new("bot2", "Bot 2")])),
            "some bots need attention"
        );
    }
}
