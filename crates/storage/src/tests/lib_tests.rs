use super::*;
use shared::domain::ListId;

#[tokio::test]
async fn open_without_cookie_issues_new_session() {
    let storage = Storage::new(60);
    let (session_id, fresh) = storage.open(None).await;
    assert!(fresh);
    assert_eq!(storage.session_count().await, 1);

    let (again, fresh) = storage.open(Some(session_id)).await;
    assert_eq!(again, session_id);
    assert!(!fresh);
    assert_eq!(storage.session_count().await, 1);
}

#[tokio::test]
async fn unknown_session_id_is_replaced() {
    let storage = Storage::new(60);
    let stranger = SessionId::generate();
    let (session_id, fresh) = storage.open(Some(stranger)).await;
    assert!(fresh);
    assert_ne!(session_id, stranger);
}

#[tokio::test]
async fn sessions_do_not_share_lists() {
    let storage = Storage::new(60);
    let (alice, _) = storage.open(None).await;
    let (bob, _) = storage.open(None).await;

    storage
        .with_session(alice, |data| {
            data.lists.push(TodoList::new(ListId(1), "Alice's list"));
        })
        .await;

    let bob_lists = storage.with_session(bob, |data| data.lists.len()).await;
    let alice_lists = storage.with_session(alice, |data| data.lists.len()).await;
    assert_eq!(bob_lists, 0);
    assert_eq!(alice_lists, 1);
}

#[tokio::test]
async fn flash_is_consumed_once() {
    let storage = Storage::new(60);
    let (session_id, _) = storage.open(None).await;

    storage
        .with_session(session_id, |data| data.set_success("The list has been created."))
        .await;
    let first = storage.with_session(session_id, SessionData::take_flash).await;
    let second = storage.with_session(session_id, SessionData::take_flash).await;

    assert_eq!(first.success.as_deref(), Some("The list has been created."));
    assert_eq!(second, Flash::default());
}

#[tokio::test]
async fn purge_drops_only_idle_sessions() {
    let storage = Storage::new(30);
    let start = Utc::now();
    let (stale, _) = storage.open_at(None, start).await;
    let (active, _) = storage.open_at(None, start).await;

    storage
        .open_at(Some(active), start + Duration::seconds(20))
        .await;

    let purged = storage.purge_expired_at(start + Duration::seconds(40)).await;
    assert_eq!(purged, 1);
    assert_eq!(storage.session_count().await, 1);

    let (reopened, fresh) = storage
        .open_at(Some(active), start + Duration::seconds(41))
        .await;
    assert_eq!(reopened, active);
    assert!(!fresh);

    let (replacement, fresh) = storage
        .open_at(Some(stale), start + Duration::seconds(41))
        .await;
    assert_ne!(replacement, stale);
    assert!(fresh);
}

#[tokio::test]
async fn expired_session_is_discarded_on_open() {
    let storage = Storage::new(10);
    let start = Utc::now();
    let (session_id, _) = storage.open_at(None, start).await;

    let (next, fresh) = storage
        .open_at(Some(session_id), start + Duration::seconds(11))
        .await;
    assert!(fresh);
    assert_ne!(next, session_id);
    assert_eq!(storage.session_count().await, 1);
}

#[test]
fn oversized_ttl_falls_back_to_default() {
    let storage = Storage::new(i64::MAX);
    assert_eq!(storage.ttl(), Duration::seconds(DEFAULT_TTL_SECONDS));

    assert_eq!(Storage::new(0).ttl(), Duration::seconds(1));
    assert_eq!(Storage::new(600).ttl(), Duration::seconds(600));
}
