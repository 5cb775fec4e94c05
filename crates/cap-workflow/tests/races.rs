//! Concurrent operations racing for the same records.
//!
//! Each test spawns its contenders on a multi-threaded runtime and checks
//! that exactly the allowed number win and every loser gets a domain error.

mod common;

use std::sync::Arc;
use std::time::Duration;

use cap_core::enums::{InvitationStatus, SupervisionDecision, SupervisionStatus};
use cap_store::MemoryStore;
use cap_workflow::{ErrorKind, PortalService, WorkflowError};
use futures::future::join_all;
use pretty_assertions::assert_eq;

use common::{active_group, fields, forming_group, proposing_group, service, service_over, student, teacher};

async fn race<T, F, Fut>(contenders: usize, op: F) -> Vec<Result<T, WorkflowError>>
where
    T: Send + 'static,
    F: Fn(usize) -> Fut,
    Fut: Future<Output = Result<T, WorkflowError>> + Send + 'static,
{
    let handles = (0..contenders).map(|i| tokio::spawn(op(i)));
    join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect()
}

fn split<T>(results: Vec<Result<T, WorkflowError>>) -> (Vec<T>, Vec<ErrorKind>) {
    let mut wins = Vec::new();
    let mut losses = Vec::new();
    for result in results {
        match result {
            Ok(v) => wins.push(v),
            Err(e) => losses.push(e.kind()),
        }
    }
    (wins, losses)
}

/// A service whose store yields on every call, widening race windows.
fn slow_service() -> Arc<PortalService> {
    let store = Arc::new(MemoryStore::new());
    store.set_latency(Duration::from_millis(2));
    service_over(store)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn student_joins_exactly_one_group() {
    let svc = slow_service();
    let bob = student(&svc, "Bob").await;
    let mut invitations = Vec::new();
    for leader in ["Ada", "Eve", "Fay"] {
        let (l, g) = forming_group(&svc, leader).await;
        invitations.push(svc.send_invitation(&l.id, &g.id, &bob.id).await.unwrap());
    }

    let results = race(invitations.len(), |i| {
        let svc = Arc::clone(&svc);
        let student_id = bob.id.clone();
        let invitation_id = invitations[i].id.clone();
        async move { svc.accept_invitation(&student_id, &invitation_id).await }
    })
    .await;
    let (wins, losses) = split(results);

    assert_eq!(wins.len(), 1);
    for kind in losses {
        assert!(
            matches!(kind, ErrorKind::AlreadyResolved | ErrorKind::AlreadyInGroup),
            "unexpected loser kind {kind}"
        );
    }
    let bob = svc.get_student(&bob.id).await.unwrap();
    assert_eq!(bob.group_id.as_deref(), Some(wins[0].id.as_str()));
    assert_eq!(bob.accepted_invitations, 1);

    let received = svc.list_received_invitations(&bob.id, None).await.unwrap();
    let accepted = received
        .iter()
        .filter(|i| i.status == InvitationStatus::Accepted)
        .count();
    assert_eq!(accepted, 1);
    assert!(received.iter().all(|i| i.status != InvitationStatus::Pending));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_invitations_respect_group_size() {
    let svc = slow_service();
    let (ada, group) = forming_group(&svc, "Ada").await;
    let mut targets = Vec::new();
    for i in 0..6 {
        targets.push(student(&svc, &format!("Target{i}")).await);
    }

    let results = race(targets.len(), |i| {
        let svc = Arc::clone(&svc);
        let leader_id = ada.id.clone();
        let group_id = group.id.clone();
        let target_id = targets[i].id.clone();
        async move { svc.send_invitation(&leader_id, &group_id, &target_id).await }
    })
    .await;
    let (wins, losses) = split(results);

    assert_eq!(wins.len(), 2);
    assert!(losses.iter().all(|k| *k == ErrorKind::GroupFull));

    let results = race(wins.len(), |i| {
        let svc = Arc::clone(&svc);
        let invitation = wins[i].clone();
        async move {
            svc.accept_invitation(&invitation.to_student_id, &invitation.id)
                .await
        }
    })
    .await;
    assert!(results.iter().all(Result::is_ok));
    assert_eq!(svc.get_group(&group.id).await.unwrap().size(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn invitation_resolves_once() {
    let svc = slow_service();
    let (ada, group) = forming_group(&svc, "Ada").await;
    let bob = student(&svc, "Bob").await;
    let invitation = svc.send_invitation(&ada.id, &group.id, &bob.id).await.unwrap();

    let results = race(3, |i| {
        let svc = Arc::clone(&svc);
        let (leader_id, student_id, id) = (ada.id.clone(), bob.id.clone(), invitation.id.clone());
        async move {
            match i {
                0 => svc.accept_invitation(&student_id, &id).await.map(|_| InvitationStatus::Accepted),
                1 => svc.decline_invitation(&student_id, &id).await.map(|i| i.status),
                _ => svc.cancel_invitation(&leader_id, &id).await.map(|i| i.status),
            }
        }
    })
    .await;
    let (wins, losses) = split(results);

    assert_eq!(wins.len(), 1);
    assert_eq!(losses, vec![ErrorKind::AlreadyResolved; 2]);
    let stored = svc.get_invitation(&invitation.id).await.unwrap();
    assert_eq!(stored.status, wins[0]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_proposal_under_racing_creates() {
    let svc = slow_service();
    let (ada, group) = active_group(&svc, "Ada").await;

    let results = race(4, |i| {
        let svc = Arc::clone(&svc);
        let (leader_id, group_id) = (ada.id.clone(), group.id.clone());
        async move {
            svc.create_proposal(&leader_id, &group_id, fields(&format!("Idea {i}")))
                .await
        }
    })
    .await;
    let (wins, losses) = split(results);

    assert_eq!(wins.len(), 1);
    assert_eq!(losses, vec![ErrorKind::ProposalAlreadyExists; 3]);
    assert_eq!(svc.get_proposal_for_group(&group.id).await.unwrap(), Some(wins[0].clone()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn teacher_capacity_under_racing_accepts() {
    let svc = service();
    let turing = teacher(&svc, "Turing", 2).await;
    let mut requests = Vec::new();
    for leader in ["Ada", "Eve", "Fay", "Gus", "Hal"] {
        let (l, g, _) = proposing_group(&svc, leader).await;
        requests.push(svc.request_supervision(&l.id, &g.id, &turing.id).await.unwrap());
    }

    let results = race(requests.len(), |i| {
        let svc = Arc::clone(&svc);
        let (teacher_id, request_id) = (turing.id.clone(), requests[i].id.clone());
        async move {
            svc.respond_to_supervision_request(&teacher_id, &request_id, SupervisionDecision::Accept)
                .await
        }
    })
    .await;
    let (wins, losses) = split(results);

    assert_eq!(wins.len(), 2);
    assert_eq!(losses, vec![ErrorKind::TeacherAtCapacity; 3]);
    let turing = svc.get_teacher(&turing.id).await.unwrap();
    assert_eq!(turing.current_students_count, 2);
    let accepted = svc
        .list_teacher_requests(&turing.id, Some(SupervisionStatus::Accepted))
        .await
        .unwrap();
    assert_eq!(accepted.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancel_and_response_resolve_once() {
    let svc = slow_service();
    let (ada, group, _) = proposing_group(&svc, "Ada").await;
    let turing = teacher(&svc, "Turing", 1).await;
    let request = svc
        .request_supervision(&ada.id, &group.id, &turing.id)
        .await
        .unwrap();

    let results = race(2, |i| {
        let svc = Arc::clone(&svc);
        let (leader_id, teacher_id, id) = (ada.id.clone(), turing.id.clone(), request.id.clone());
        async move {
            if i == 0 {
                svc.cancel_supervision_request(&leader_id, &id).await
            } else {
                svc.respond_to_supervision_request(&teacher_id, &id, SupervisionDecision::Accept)
                    .await
            }
        }
    })
    .await;
    let (wins, losses) = split(results);

    assert_eq!(wins.len(), 1);
    assert_eq!(losses, vec![ErrorKind::AlreadyResolved]);
    let load = svc.get_teacher(&turing.id).await.unwrap().current_students_count;
    let expected = u32::from(wins[0].status == SupervisionStatus::Accepted);
    assert_eq!(load, expected);
}
