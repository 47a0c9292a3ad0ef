//! Schedule board tests against a mock source.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cqrd_report::schedule::{parse_time_of_day, NewSchedule, RunOutcome, ScheduleBoard};
use cqrd_report::Frequency;
use cqrd_source::SourceClient;

fn board(base_url: &str) -> ScheduleBoard {
    let source = Arc::new(
        SourceClient::with_base_url(base_url, Some("test-key"), 30, 0, 0)
            .expect("client construction should not fail"),
    );
    ScheduleBoard::new(source)
}

async fn mount_put(server: &MockServer) {
    Mock::given(method("PUT"))
        .and(path_regex(r"^/v1/schedules/[0-9a-f-]+$"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

fn utc(value: &str) -> DateTime<Utc> {
    value.parse().unwrap()
}

fn daily_digest() -> NewSchedule {
    NewSchedule {
        template_id: "executive-summary".to_owned(),
        frequency: Frequency::Daily,
        time_of_day: parse_time_of_day("09:00").unwrap(),
        timezone: "UTC".parse().unwrap(),
        recipients: vec!["ops@example.com".to_owned()],
    }
}

#[tokio::test]
async fn scheduling_computes_the_first_run_and_persists() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/v1/schedules/[0-9a-f-]+$"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let board = board(&server.uri());
    let schedule = board
        .schedule(daily_digest(), utc("2026-08-22T07:00:00Z"))
        .await;

    assert_eq!(schedule.next_run, utc("2026-08-22T09:00:00Z"));
    assert!(schedule.enabled);
    assert_eq!(schedule.last_run, None);
    assert_eq!(board.list().len(), 1);
    assert!(board.get(schedule.id).is_some());
}

#[tokio::test]
async fn claimed_schedules_are_not_claimed_again_until_completed() {
    let server = MockServer::start().await;
    mount_put(&server).await;

    let board = board(&server.uri());
    let schedule = board
        .schedule(daily_digest(), utc("2026-08-22T07:00:00Z"))
        .await;

    let claimed = board.claim_due(utc("2026-08-22T09:30:00Z"));
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].id, schedule.id);

    // Still running, so the same tick instant claims nothing.
    assert!(board.claim_due(utc("2026-08-22T09:30:00Z")).is_empty());

    board
        .complete_run(schedule.id, utc("2026-08-22T09:30:05Z"), RunOutcome::Success)
        .await;

    let updated = board.get(schedule.id).unwrap();
    assert_eq!(updated.last_run, Some(utc("2026-08-22T09:30:05Z")));
    assert_eq!(updated.next_run, utc("2026-08-23T09:00:00Z"));
    assert!(board.claim_due(utc("2026-08-22T09:30:05Z")).is_empty());
}

#[tokio::test]
async fn failed_runs_advance_without_marking_last_run() {
    let server = MockServer::start().await;
    mount_put(&server).await;

    let board = board(&server.uri());
    let schedule = board
        .schedule(daily_digest(), utc("2026-08-22T07:00:00Z"))
        .await;

    let claimed = board.claim_due(utc("2026-08-22T09:10:00Z"));
    assert_eq!(claimed.len(), 1);

    board
        .complete_run(schedule.id, utc("2026-08-22T09:10:30Z"), RunOutcome::Failure)
        .await;

    let updated = board.get(schedule.id).unwrap();
    assert_eq!(updated.last_run, None);
    assert_eq!(updated.next_run, utc("2026-08-23T09:00:00Z"));
}

#[tokio::test]
async fn disabled_schedules_are_never_claimed() {
    let server = MockServer::start().await;
    mount_put(&server).await;

    let board = board(&server.uri());
    let schedule = board
        .schedule(daily_digest(), utc("2026-08-22T07:00:00Z"))
        .await;

    assert!(board.unschedule(schedule.id).await);
    assert!(board.claim_due(utc("2027-01-01T00:00:00Z")).is_empty());

    let listed = board.list();
    assert_eq!(listed.len(), 1);
    assert!(!listed[0].enabled);

    assert!(!board.unschedule(Uuid::new_v4()).await);
}

#[tokio::test]
async fn load_restores_valid_schedules_and_skips_broken_records() {
    let server = MockServer::start().await;
    let valid_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/v1/schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "schedules": [
                {
                    "id": valid_id,
                    "template_id": "executive-summary",
                    "frequency": "daily",
                    "time_of_day": "09:00:00",
                    "timezone": "UTC",
                    "recipients": ["ops@example.com"],
                    "enabled": true,
                    "last_run": "2026-08-21T09:00:02Z",
                    "next_run": "2026-08-22T09:00:00Z"
                },
                {
                    "id": Uuid::new_v4(),
                    "template_id": "content-quality",
                    "frequency": "sometimes",
                    "time_of_day": "09:00:00",
                    "timezone": "UTC",
                    "recipients": [],
                    "enabled": true
                }
            ]
        })))
        .mount(&server)
        .await;

    let board = board(&server.uri());
    let restored = board.load().await.expect("load should succeed");

    assert_eq!(restored, 1);
    let listed = board.list();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, valid_id);
    assert_eq!(listed[0].next_run, utc("2026-08-22T09:00:00Z"));
    assert_eq!(listed[0].last_run, Some(utc("2026-08-21T09:00:02Z")));
}

#[tokio::test]
async fn load_failure_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/schedules"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let board = board(&server.uri());
    assert!(board.load().await.is_err());
}
