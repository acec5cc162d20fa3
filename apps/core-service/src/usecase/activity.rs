//! # 操作履歴の記録
//!
//! 経費の登録・編集・取消を操作履歴に追記する。
//! 記録は fire-and-forget で、失敗しても呼び出し元の操作結果は変わらない。

use std::sync::Arc;

use aleya_domain::{
    activity_log::{ActivityAction, ActivityLog},
    clock::Clock,
    expense::ExpenseId,
    user::UserId,
};
use aleya_infra::repository::ActivityLogRepository;
use aleya_shared::{
    event_log::{error as log_error, event},
    log_business_event,
};
use serde_json::{Map, Value as JsonValue};

/// 操作履歴ロガー
pub struct ActivityLogger {
    repo:  Arc<dyn ActivityLogRepository>,
    clock: Arc<dyn Clock>,
}

impl ActivityLogger {
    pub fn new(repo: Arc<dyn ActivityLogRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// 経費に対する操作を記録する（fire-and-forget）
    ///
    /// `details` に `description` と `expenseId` を付け加えて保存する。
    pub async fn record_expense(
        &self,
        actor_id: &UserId,
        action: ActivityAction,
        expense_id: &ExpenseId,
        description: impl Into<String>,
        mut details: Map<String, JsonValue>,
    ) {
        details.insert("description".to_string(), JsonValue::String(description.into()));
        details.insert(
            "expenseId".to_string(),
            JsonValue::String(expense_id.to_string()),
        );
        let log = ActivityLog::for_expenses(
            actor_id.clone(),
            action,
            JsonValue::Object(details),
            self.clock.now(),
        );
        let action_str: &str = action.into();

        match self.repo.record(&log).await {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::ACTIVITY,
                    event.action = event::action::ACTIVITY_RECORDED,
                    event.entity_type = event::entity_type::ACTIVITY_LOG,
                    event.entity_id = %log.id,
                    event.actor_id = %actor_id,
                    event.result = event::result::SUCCESS,
                    activity.action = action_str,
                    "操作履歴を記録"
                );
            }
            Err(e) => {
                log_business_event!(
                    event.category = event::category::ACTIVITY,
                    event.action = event::action::ACTIVITY_FAILED,
                    event.entity_type = event::entity_type::ACTIVITY_LOG,
                    event.actor_id = %actor_id,
                    event.result = event::result::FAILURE,
                    activity.action = action_str,
                    expense_id = %expense_id,
                    "操作履歴の記録に失敗"
                );
                tracing::error!(
                    error.category = log_error::category::SIDE_EFFECT,
                    error.kind = log_error::kind::ACTIVITY_LOG,
                    error = %e,
                    activity.action = action_str,
                    expense_id = %expense_id,
                    "操作履歴の保存に失敗"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use aleya_domain::clock::FixedClock;
    use aleya_infra::mock::MockActivityLogRepository;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tracing_subscriber::{Layer, layer::Context, prelude::*};

    use super::*;

    /// イベントの文字列フィールドを記録するレイヤー
    struct CaptureLayer {
        events: Arc<Mutex<Vec<Vec<(String, String)>>>>,
    }

    impl<S: tracing::Subscriber> Layer<S> for CaptureLayer {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = FieldVisitor::default();
            event.record(&mut visitor);
            self.events.lock().unwrap().push(visitor.fields);
        }
    }

    #[derive(Default)]
    struct FieldVisitor {
        fields: Vec<(String, String)>,
    }

    impl tracing::field::Visit for FieldVisitor {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            self.fields
                .push((field.name().to_string(), format!("{:?}", value)));
        }

        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            self.fields
                .push((field.name().to_string(), value.to_string()));
        }
    }

    fn setup_capture() -> (
        tracing::subscriber::DefaultGuard,
        Arc<Mutex<Vec<Vec<(String, String)>>>>,
    ) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(CaptureLayer {
            events: events.clone(),
        });
        (tracing::subscriber::set_default(subscriber), events)
    }

    fn field<'a>(event: &'a [(String, String)], name: &str) -> Option<&'a str> {
        event
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn make_logger(repo: &MockActivityLogRepository) -> ActivityLogger {
        let now = Utc.with_ymd_and_hms(2025, 1, 5, 9, 0, 0).unwrap();
        ActivityLogger::new(Arc::new(repo.clone()), Arc::new(FixedClock::new(now)))
    }

    #[tokio::test]
    async fn 説明と経費idを詳細に含めて記録する() {
        let repo = MockActivityLogRepository::new();
        let sut = make_logger(&repo);
        let actor_id = UserId::new();
        let expense_id = ExpenseId::new();
        let mut details = Map::new();
        details.insert("reason".to_string(), json!("Pagado dos veces"));

        sut.record_expense(
            &actor_id,
            ActivityAction::ExpenseCancel,
            &expense_id,
            "Anuló el egreso",
            details,
        )
        .await;

        let logs = repo.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].user_id, actor_id);
        assert_eq!(logs[0].action, ActivityAction::ExpenseCancel);
        assert_eq!(logs[0].module, "egresos");
        assert_eq!(
            logs[0].details,
            json!({
                "description": "Anuló el egreso",
                "expenseId": expense_id.to_string(),
                "reason": "Pagado dos veces",
            })
        );
    }

    #[tokio::test]
    async fn 記録に失敗しても呼び出し元にエラーを返さない() {
        let repo = MockActivityLogRepository::new();
        repo.set_failing(true);
        let sut = make_logger(&repo);

        sut.record_expense(
            &UserId::new(),
            ActivityAction::ExpenseCreate,
            &ExpenseId::new(),
            "Registró un egreso",
            Map::new(),
        )
        .await;

        assert!(repo.logs().is_empty());
    }

    #[tokio::test]
    async fn 記録に失敗するとactivity_failedのビジネスイベントを出す() {
        let (_guard, events) = setup_capture();
        let repo = MockActivityLogRepository::new();
        repo.set_failing(true);
        let sut = make_logger(&repo);
        let expense_id = ExpenseId::new();

        sut.record_expense(
            &UserId::new(),
            ActivityAction::ExpenseCancel,
            &expense_id,
            "Anuló el egreso",
            Map::new(),
        )
        .await;

        let captured = events.lock().unwrap();
        let failed = captured
            .iter()
            .find(|e| field(e, "event.action") == Some(event::action::ACTIVITY_FAILED))
            .expect("activity.failed のイベントが出力されること");
        assert_eq!(field(failed, "event.kind"), Some("business_event"));
        assert_eq!(field(failed, "event.result"), Some(event::result::FAILURE));
        assert_eq!(field(failed, "activity.action"), Some("expense_cancel"));
        let expense_id = expense_id.to_string();
        assert_eq!(field(failed, "expense_id"), Some(expense_id.as_str()));
    }
}
