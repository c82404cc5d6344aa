//! Realtime dispatcher integration tests
//!
//! Sessions are driven directly, without a socket; `next` gives up after a
//! short timeout so "nothing was sent" can be asserted.

use std::time::Duration;

use pixelcollab::backend::realtime::{dispatch, Session};
use pixelcollab::shared::{ClientMessage, PixelEdit, ServerMessage};
use tokio::time::timeout;

use crate::common::*;

async fn next(session: &mut Session) -> Option<ServerMessage> {
    timeout(Duration::from_millis(50), session.next_outbound())
        .await
        .ok()
        .flatten()
}

fn edit(project_id: i64, x: usize, y: usize, color: &str) -> ClientMessage {
    ClientMessage::PixelEdit(PixelEdit {
        project_id,
        x,
        y,
        color: color.to_string(),
    })
}

#[tokio::test]
async fn test_room_members_see_edits_in_order() {
    let (state, _memory) = test_state().await;
    let project = active_project(&state, &TestUser::new("ada"), "foo", 4).await;

    let mut painter = Session::new(state.hub.clone());
    let mut watcher = Session::new(state.hub.clone());
    let mut outsider = Session::new(state.hub.clone());
    dispatch(&state, &mut painter, ClientMessage::JoinRoom { project_id: project.id }).await;
    dispatch(&state, &mut watcher, ClientMessage::JoinRoom { project_id: project.id }).await;

    for (i, color) in ["#100", "#200", "#300"].iter().enumerate() {
        dispatch(&state, &mut painter, edit(project.id, i, 0, color)).await;
    }

    for session in [&mut painter, &mut watcher] {
        for expected in ["#100", "#200", "#300"] {
            match next(session).await {
                Some(ServerMessage::Pixel(pixel)) => assert_eq!(pixel.color, expected),
                other => panic!("Expected pixel {}, got {:?}", expected, other),
            }
        }
    }
    assert_eq!(next(&mut outsider).await, None);
}

#[tokio::test]
async fn test_out_of_bounds_edit_is_dropped() {
    let (state, _memory) = test_state().await;
    let project = active_project(&state, &TestUser::new("ada"), "foo", 2).await;
    let mut session = Session::new(state.hub.clone());
    dispatch(&state, &mut session, ClientMessage::JoinRoom { project_id: project.id }).await;

    dispatch(&state, &mut session, edit(project.id, 5, 5, "#000")).await;

    assert_eq!(next(&mut session).await, None);
    let registry = state.registry.read().await;
    assert_eq!(registry.find_by_id(project.id).unwrap().grid, project.grid);
}

#[tokio::test]
async fn test_left_room_stops_receiving() {
    let (state, _memory) = test_state().await;
    let project = active_project(&state, &TestUser::new("ada"), "foo", 2).await;
    let mut session = Session::new(state.hub.clone());
    let mut painter = Session::new(state.hub.clone());

    dispatch(&state, &mut session, ClientMessage::JoinRoom { project_id: project.id }).await;
    dispatch(&state, &mut session, ClientMessage::LeaveRoom { project_id: project.id }).await;
    dispatch(&state, &mut painter, edit(project.id, 0, 0, "#000")).await;

    assert_eq!(next(&mut session).await, None);
}

#[tokio::test]
async fn test_snapshot_reply_goes_to_sender_only() {
    let (state, _memory) = test_state().await;
    let project = active_project(&state, &TestUser::new("ada"), "foo", 2).await;
    let mut asker = Session::new(state.hub.clone());
    let mut other = Session::new(state.hub.clone());

    dispatch(&state, &mut asker, ClientMessage::RequestSnapshot).await;

    assert_eq!(
        next(&mut asker).await,
        Some(ServerMessage::Projects {
            projects: vec![project]
        })
    );
    assert_eq!(next(&mut other).await, None);
}

#[tokio::test]
async fn test_finish_moves_everyone_to_the_next_project() {
    let (state, _memory) = test_state().await;
    let ada = TestUser::new("ada");
    let first = active_project(&state, &ada, "first", 2).await;
    let second = active_project(&state, &ada, "second", 2).await;
    let mut finisher = Session::new(state.hub.clone());
    let mut bystander = Session::new(state.hub.clone());

    dispatch(&state, &mut finisher, ClientMessage::FinishProject { project_id: first.id }).await;

    for session in [&mut finisher, &mut bystander] {
        assert_eq!(
            next(session).await,
            Some(ServerMessage::CurrentProject { project_id: second.id })
        );
        match next(session).await {
            Some(ServerMessage::Projects { projects }) => {
                assert_eq!(projects.iter().map(|p| p.id).collect::<Vec<_>>(), vec![second.id]);
            }
            other => panic!("Expected projects, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_delete_of_finished_project_is_acknowledged() {
    let (state, _memory) = test_state().await;
    let project = finished_project(&state, &TestUser::new("ada"), "done", false).await;
    let mut session = Session::new(state.hub.clone());

    dispatch(&state, &mut session, ClientMessage::DeleteProject { project_id: project.id }).await;

    match next(&mut session).await {
        Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "already_finished"),
        other => panic!("Expected error, got {:?}", other),
    }
    assert_eq!(next(&mut session).await, None);
}

#[tokio::test]
async fn test_failed_save_rebroadcasts_memory_state() {
    let (state, memory) = test_state().await;
    let project = active_project(&state, &TestUser::new("ada"), "foo", 2).await;
    let mut saver = Session::new(state.hub.clone());
    let mut other = Session::new(state.hub.clone());

    memory.set_fail_writes(true);
    dispatch(&state, &mut saver, ClientMessage::SaveProject { project_id: project.id }).await;

    match next(&mut saver).await {
        Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "store_failure"),
        other => panic!("Expected error, got {:?}", other),
    }
    for session in [&mut saver, &mut other] {
        assert!(matches!(next(session).await, Some(ServerMessage::Projects { .. })));
    }
}

#[tokio::test]
async fn test_gallery_request_lists_public_projects() {
    let (state, _memory) = test_state().await;
    let ada = TestUser::new("ada");
    let public = finished_project(&state, &ada, "public", true).await;
    finished_project(&state, &ada, "private", false).await;
    let mut session = Session::new(state.hub.clone());

    dispatch(&state, &mut session, ClientMessage::RequestGallery).await;

    match next(&mut session).await {
        Some(ServerMessage::Gallery { projects }) => {
            assert_eq!(projects.len(), 1);
            assert_eq!(projects[0].project.id, public.id);
        }
        other => panic!("Expected gallery, got {:?}", other),
    }
}
