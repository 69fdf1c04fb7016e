mod common;

use anyhow::Result;
use common::{controller, controller_with, fixed_now, stored_blob, stored_json, ViewEvent};
use mapty_lib::controller::{INVALID_INPUT_MESSAGE, NO_LOCATION_MESSAGE, NO_POSITION_MESSAGE};
use mapty_lib::{
    Command, ControllerError, Coords, EditSession, FixedPosition, MemoryStorage, Outcome,
    PersistenceAdapter, StoreError, ValidationError, Workout, WorkoutInput, WorkoutKind,
};

fn create_at(
    controller: &mut common::TestController,
    coords: Coords,
    input: WorkoutInput,
) -> Result<String> {
    controller.show_form(coords);
    match controller.submit(&input)? {
        Outcome::Created(id) => Ok(id),
        other => anyhow::bail!("expected a new workout, got {other:?}"),
    }
}

fn map_ready_controller() -> Result<common::TestController> {
    let mut controller = controller();
    controller.init_map(&mut FixedPosition(Some(Coords::new(10.0, 20.0))))?;
    Ok(controller)
}

#[test]
fn test_create_running_workout() -> Result<()> {
    let mut controller = controller();
    let id = create_at(
        &mut controller,
        Coords::new(10.0, 20.0),
        WorkoutInput::running(5.0, 25.0, 150.0),
    )?;

    let workout = controller.store().find_by_id(&id).expect("workout was added");
    assert_eq!(workout.kind(), WorkoutKind::Running);
    assert_eq!(workout.metric(), 5.0);
    assert_eq!(workout.description(), "Running on April 2");
    assert_eq!(workout.coords(), Coords::new(10.0, 20.0));
    assert_eq!(workout.created_at(), fixed_now());
    assert_eq!(workout.interaction_count(), 0);

    let events = &controller.view().events;
    assert!(events.contains(&ViewEvent::RemoveAllVisible(true)));
    assert!(events.contains(&ViewEvent::ListEntry {
        id: id.clone(),
        replaced: None
    }));
    assert_eq!(events.last(), Some(&ViewEvent::HideForm));
    assert_eq!(controller.pending_location(), None);

    let json = stored_json(&controller);
    assert_eq!(json[0]["id"], id.as_str());
    assert_eq!(json[0]["type"], "running");
    assert_eq!(json[0]["coords"], serde_json::json!([10.0, 20.0]));
    assert_eq!(json[0]["cadence"], 150.0);
    Ok(())
}

#[test]
fn test_create_without_map_click_is_rejected() {
    let mut controller = controller();
    let result = controller.submit(&WorkoutInput::running(5.0, 25.0, 150.0));

    assert!(matches!(result, Err(ControllerError::NoLocation)));
    assert!(controller.store().is_empty());
    assert_eq!(controller.view().notifications(), vec![NO_LOCATION_MESSAGE]);
    assert_eq!(stored_blob(&controller), None);
}

#[test]
fn test_invalid_input_keeps_form_open_and_state_unchanged() {
    let mut controller = controller();
    controller.show_form(Coords::new(1.0, 2.0));

    for input in [
        WorkoutInput::running(0.0, 25.0, 150.0),
        WorkoutInput::running(5.0, -1.0, 150.0),
        WorkoutInput::running(5.0, 25.0, 0.0),
        WorkoutInput::running(f64::NAN, 25.0, 150.0),
        WorkoutInput::cycling(10.0, f64::INFINITY, 100.0),
        WorkoutInput::cycling(10.0, 30.0, f64::NAN),
    ] {
        let result = controller.submit(&input);
        assert!(
            matches!(result, Err(ControllerError::Validation(_))),
            "{input:?} should be rejected"
        );
    }

    assert!(controller.store().is_empty());
    assert_eq!(controller.pending_location(), Some(Coords::new(1.0, 2.0)));
    assert!(!controller.view().events.contains(&ViewEvent::HideForm));
    assert!(controller
        .view()
        .notifications()
        .iter()
        .all(|m| *m == INVALID_INPUT_MESSAGE));
    assert_eq!(stored_blob(&controller), None);
}

#[test]
fn test_cycling_allows_zero_elevation() -> Result<()> {
    let mut controller = controller();
    let id = create_at(
        &mut controller,
        Coords::new(1.0, 1.0),
        WorkoutInput::cycling(10.0, 30.0, 0.0),
    )?;
    let workout = controller.store().find_by_id(&id).expect("workout was added");
    assert_eq!(workout.metric(), 20.0);
    assert_eq!(workout.variant_value(), 0.0);
    Ok(())
}

#[test]
fn test_non_finite_position_is_rejected() -> Result<()> {
    let mut controller = controller();
    create_at(
        &mut controller,
        Coords::new(1.0, 1.0),
        WorkoutInput::running(5.0, 25.0, 150.0),
    )?;
    let before = controller.store().workouts().to_vec();
    let blob_before = stored_blob(&controller);
    controller.view_mut().clear_events();

    for coords in [Coords::new(f64::NAN, 20.0), Coords::new(10.0, f64::INFINITY)] {
        controller.show_form(coords);
        let result = controller.submit(&WorkoutInput::running(5.0, 25.0, 150.0));
        assert!(
            matches!(
                result,
                Err(ControllerError::Validation(ValidationError::Coords { .. }))
            ),
            "{coords:?} should be rejected"
        );
    }

    assert_eq!(controller.store().workouts(), before.as_slice());
    assert_eq!(stored_blob(&controller), blob_before);
    assert_eq!(
        controller.view().notifications(),
        vec![INVALID_INPUT_MESSAGE, INVALID_INPUT_MESSAGE]
    );
    assert!(!controller.view().events.contains(&ViewEvent::HideForm));

    let reloaded = PersistenceAdapter::new(controller.persistence().storage().clone()).load();
    assert_eq!(reloaded, before);
    Ok(())
}

#[test]
fn test_ids_stay_unique_with_same_timestamp() -> Result<()> {
    let mut controller = controller();
    let first = create_at(
        &mut controller,
        Coords::new(0.0, 0.0),
        WorkoutInput::running(1.0, 5.0, 160.0),
    )?;
    let second = create_at(
        &mut controller,
        Coords::new(0.0, 1.0),
        WorkoutInput::running(2.0, 10.0, 160.0),
    )?;

    assert_ne!(first, second);
    assert_eq!(first.len(), 10);
    assert_eq!(second.len(), 10);
    assert_eq!(controller.store().len(), 2);
    assert_eq!(controller.store().workouts()[0].id(), first);
    Ok(())
}

#[test]
fn test_edit_preserves_identity() -> Result<()> {
    let mut controller = map_ready_controller()?;
    let id = create_at(
        &mut controller,
        Coords::new(10.0, 20.0),
        WorkoutInput::running(5.0, 25.0, 150.0),
    )?;
    controller.select(&id)?;
    controller.select(&id)?;
    let original = controller.store().find_by_id(&id).cloned().expect("exists");
    let old_marker = *controller.markers().get(&id).expect("marker registered");
    controller.view_mut().clear_events();

    controller.request_edit(&id)?;
    assert_eq!(controller.session(), &EditSession::Editing(id.clone()));
    assert_eq!(
        controller.view().events.last(),
        Some(&ViewEvent::ShowForm(Some(WorkoutInput::running(5.0, 25.0, 150.0))))
    );

    let outcome = controller.submit(&WorkoutInput::cycling(20.0, 60.0, 300.0))?;
    assert_eq!(outcome, Outcome::Edited(id.clone()));

    let edited = controller.store().find_by_id(&id).expect("still present");
    assert_eq!(edited.id(), original.id());
    assert_eq!(edited.created_at(), original.created_at());
    assert_eq!(edited.interaction_count(), 2);
    assert_eq!(edited.coords(), original.coords());
    assert_eq!(edited.kind(), WorkoutKind::Cycling);
    assert_eq!(edited.metric(), 20.0);
    assert_eq!(edited.description(), "Cycling on April 2");
    assert_eq!(controller.store().len(), 1);
    assert_eq!(controller.session(), &EditSession::Idle);

    let events = &controller.view().events;
    assert!(events.contains(&ViewEvent::ListEntry {
        id: id.clone(),
        replaced: Some(id.clone())
    }));
    let removed_at = events
        .iter()
        .position(|e| *e == ViewEvent::RemoveMarker(old_marker))
        .expect("old marker retired");
    let placed_at = events
        .iter()
        .position(|e| matches!(e, ViewEvent::Marker { is_replace: true, .. }))
        .expect("new marker placed");
    assert!(removed_at < placed_at);
    assert_eq!(controller.markers().len(), 1);
    assert_ne!(controller.markers().get(&id), Some(&old_marker));
    assert_eq!(controller.view().live_markers.len(), 1);

    let json = stored_json(&controller);
    assert_eq!(json[0]["type"], "cycling");
    assert_eq!(json[0]["elevationGain"], 300.0);
    assert_eq!(json[0]["clicks"], 2);
    Ok(())
}

#[test]
fn test_invalid_edit_keeps_session_open() -> Result<()> {
    let mut controller = controller();
    let id = create_at(
        &mut controller,
        Coords::new(0.0, 0.0),
        WorkoutInput::running(5.0, 25.0, 150.0),
    )?;
    controller.request_edit(&id)?;

    let result = controller.submit(&WorkoutInput::running(5.0, 25.0, -3.0));
    assert!(matches!(result, Err(ControllerError::Validation(_))));
    assert!(controller.session().is_editing());
    assert_eq!(controller.store().find_by_id(&id).map(Workout::variant_value), Some(150.0));

    controller.close_form();
    assert_eq!(controller.session(), &EditSession::Idle);
    Ok(())
}

#[test]
fn test_edit_of_vanished_workout_aborts_to_idle() -> Result<()> {
    let mut controller = controller();
    let id = create_at(
        &mut controller,
        Coords::new(0.0, 0.0),
        WorkoutInput::running(5.0, 25.0, 150.0),
    )?;
    controller.request_edit(&id)?;
    controller.delete(&id)?;

    let result = controller.submit(&WorkoutInput::running(6.0, 30.0, 150.0));
    assert!(matches!(result, Err(ref e) if e.is_not_found()));
    assert_eq!(controller.session(), &EditSession::Idle);
    assert!(controller.store().is_empty());
    Ok(())
}

#[test]
fn test_request_edit_unknown_id() {
    let mut controller = controller();
    let result = controller.request_edit("missing");
    assert!(matches!(
        result,
        Err(ControllerError::Store(StoreError::NotFound(ref id))) if id == "missing"
    ));
    assert_eq!(controller.session(), &EditSession::Idle);
}

#[test]
fn test_delete_missing_id_leaves_store_unchanged() -> Result<()> {
    let mut controller = controller();
    create_at(&mut controller, Coords::new(0.0, 0.0), WorkoutInput::running(5.0, 25.0, 150.0))?;
    create_at(&mut controller, Coords::new(1.0, 1.0), WorkoutInput::cycling(10.0, 30.0, 50.0))?;
    let before = controller.store().workouts().to_vec();
    let blob_before = stored_blob(&controller);

    let result = controller.delete("0000000000");

    assert!(matches!(result, Err(ref e) if e.is_not_found()));
    assert_eq!(controller.store().workouts(), before.as_slice());
    assert_eq!(stored_blob(&controller), blob_before);
    Ok(())
}

#[test]
fn test_delete_last_workout_hides_remove_all() -> Result<()> {
    let mut controller = map_ready_controller()?;
    let first = create_at(
        &mut controller,
        Coords::new(0.0, 0.0),
        WorkoutInput::running(5.0, 25.0, 150.0),
    )?;
    let second = create_at(
        &mut controller,
        Coords::new(1.0, 1.0),
        WorkoutInput::cycling(10.0, 30.0, 50.0),
    )?;

    controller.delete(&first)?;
    assert_eq!(controller.view().last_remove_all_visibility(), Some(true));
    assert_eq!(controller.markers().len(), 1);
    assert!(controller.view().events.contains(&ViewEvent::RemoveListEntry(first)));

    controller.delete(&second)?;
    assert_eq!(controller.view().last_remove_all_visibility(), Some(false));
    assert!(controller.markers().is_empty());
    assert!(controller.view().live_markers.is_empty());
    assert_eq!(stored_json(&controller), serde_json::json!([]));
    Ok(())
}

#[test]
fn test_clear_all_on_three_workouts() -> Result<()> {
    let mut controller = map_ready_controller()?;
    create_at(&mut controller, Coords::new(0.0, 0.0), WorkoutInput::running(5.0, 25.0, 150.0))?;
    create_at(&mut controller, Coords::new(1.0, 1.0), WorkoutInput::cycling(10.0, 30.0, 50.0))?;
    create_at(&mut controller, Coords::new(2.0, 2.0), WorkoutInput::running(3.0, 18.0, 170.0))?;
    assert_eq!(controller.markers().len(), 3);

    let outcome = controller.handle(Command::ClearAll)?;

    assert_eq!(outcome, Outcome::Cleared(3));
    assert!(controller.store().is_empty());
    assert!(controller.markers().is_empty());
    assert!(controller.view().live_markers.is_empty());
    assert_eq!(stored_json(&controller), serde_json::json!([]));
    assert_eq!(controller.view().last_remove_all_visibility(), Some(false));
    assert!(controller
        .view()
        .events
        .contains(&ViewEvent::RemoveAllListEntries));
    Ok(())
}

#[test]
fn test_select_counts_clicks_without_saving() -> Result<()> {
    let mut controller = map_ready_controller()?;
    let id = create_at(
        &mut controller,
        Coords::new(5.0, 6.0),
        WorkoutInput::running(5.0, 25.0, 150.0),
    )?;

    let outcome = controller.handle(Command::Select(id.clone()))?;
    assert_eq!(
        outcome,
        Outcome::Selected {
            id: id.clone(),
            interaction_count: 1
        }
    );
    assert_eq!(
        controller.view().events.last(),
        Some(&ViewEvent::CenterMap(Coords::new(5.0, 6.0), 13))
    );
    assert_eq!(stored_json(&controller)[0]["clicks"], 0);

    controller.flush()?;
    assert_eq!(stored_json(&controller)[0]["clicks"], 1);

    let missing = controller.select("nope");
    assert!(matches!(missing, Err(ref e) if e.is_not_found()));
    Ok(())
}

#[test]
fn test_restore_renders_saved_workouts() -> Result<()> {
    let mut first = controller();
    create_at(&mut first, Coords::new(0.0, 0.0), WorkoutInput::running(5.0, 25.0, 150.0))?;
    create_at(&mut first, Coords::new(1.0, 1.0), WorkoutInput::cycling(10.0, 30.0, 50.0))?;
    let storage = first.persistence().storage().clone();

    let mut second = controller_with(storage);
    assert_eq!(second.restore(), 2);
    assert_eq!(second.store().workouts(), first.store().workouts());
    let list_entries = second
        .view()
        .events
        .iter()
        .filter(|e| matches!(e, ViewEvent::ListEntry { replaced: None, .. }))
        .count();
    assert_eq!(list_entries, 2);
    assert_eq!(second.view().last_remove_all_visibility(), Some(true));
    assert!(second.markers().is_empty());

    second.init_map(&mut FixedPosition(Some(Coords::new(0.5, 0.5))))?;
    assert!(second.is_map_ready());
    assert_eq!(second.markers().len(), 2);
    Ok(())
}

#[test]
fn test_restore_again_retires_previous_markers() -> Result<()> {
    let mut first = controller();
    create_at(
        &mut first,
        Coords::new(0.0, 0.0),
        WorkoutInput::running(5.0, 25.0, 150.0),
    )?;
    create_at(
        &mut first,
        Coords::new(1.0, 1.0),
        WorkoutInput::cycling(10.0, 30.0, 50.0),
    )?;

    let mut second = controller_with(first.persistence().storage().clone());
    second.restore();
    second.init_map(&mut FixedPosition(Some(Coords::new(0.5, 0.5))))?;
    let old_handles = second.view().live_markers.clone();
    assert_eq!(old_handles.len(), 2);
    second.view_mut().clear_events();

    assert_eq!(second.restore(), 2);
    assert_eq!(second.store().len(), 2);
    assert_eq!(second.markers().len(), 2);
    assert_eq!(second.view().live_markers.len(), 2);
    assert!(old_handles
        .iter()
        .all(|h| !second.view().live_markers.contains(h)));
    assert_eq!(
        second.view().events.first(),
        Some(&ViewEvent::RemoveAllListEntries)
    );
    for handle in &old_handles {
        assert!(second.view().events.contains(&ViewEvent::RemoveMarker(*handle)));
    }
    Ok(())
}

#[test]
fn test_restore_of_empty_storage_hides_remove_all() {
    let mut controller = controller();
    assert_eq!(controller.restore(), 0);
    assert_eq!(controller.view().last_remove_all_visibility(), Some(false));
}

#[test]
fn test_geolocation_failure_disables_markers() -> Result<()> {
    let mut controller = controller().with_map_zoom(15);
    let result = controller.init_map(&mut FixedPosition(None));

    assert!(matches!(result, Err(ControllerError::Geolocation(_))));
    assert!(!controller.is_map_ready());
    assert_eq!(controller.view().notifications(), vec![NO_POSITION_MESSAGE]);

    let id = create_at(

        &mut controller,

        Coords::new(0.0, 0.0),

        WorkoutInput::running(5.0, 25.0, 150.0),

    )?;
    assert!(controller.markers().is_empty());
    controller.select(&id)?;
    assert!(!controller
        .view()
        .events
        .iter()
        .any(|e| matches!(e, ViewEvent::CenterMap(..))));
    controller.delete(&id)?;
    Ok(())
}

#[test]
fn test_map_init_uses_configured_zoom() -> Result<()> {
    let mut controller = controller().with_map_zoom(15);
    let position = controller.init_map(&mut FixedPosition(Some(Coords::new(3.0, 4.0))))?;
    assert_eq!(position, Coords::new(3.0, 4.0));
    assert_eq!(
        controller.view().events,
        vec![ViewEvent::CenterMap(Coords::new(3.0, 4.0), 15)]
    );
    Ok(())
}

#[test]
fn test_save_failure_does_not_interrupt() -> Result<()> {
    let mut controller = controller_with(MemoryStorage::with_quota(16));
    let id = create_at(
        &mut controller,
        Coords::new(0.0, 0.0),
        WorkoutInput::running(5.0, 25.0, 150.0),
    )?;

    assert!(controller.store().find_by_id(&id).is_some());
    assert_eq!(stored_blob(&controller), None);
    assert!(controller.flush().is_err());
    controller.delete(&id)?;
    assert!(controller.store().is_empty());
    Ok(())
}

#[test]
fn test_reset_removes_snapshot() -> Result<()> {
    let mut controller = controller();
    create_at(&mut controller, Coords::new(0.0, 0.0), WorkoutInput::running(5.0, 25.0, 150.0))?;
    assert!(stored_blob(&controller).is_some());

    let removed = controller.reset()?;
    assert_eq!(removed, 1);
    assert!(controller.store().is_empty());
    assert_eq!(stored_blob(&controller), None);
    Ok(())
}

#[test]
fn test_command_dispatch_round_trip() -> Result<()> {
    let mut controller = controller();
    assert_eq!(
        controller.handle(Command::ShowForm(Coords::new(7.0, 8.0)))?,
        Outcome::FormShown
    );
    let Outcome::Created(id) =
        controller.handle(Command::Submit(WorkoutInput::cycling(15.0, 45.0, 120.0)))?
    else {
        anyhow::bail!("expected creation");
    };
    assert_eq!(
        controller.handle(Command::RequestEdit(id.clone()))?,
        Outcome::EditStarted(id.clone())
    );
    assert_eq!(controller.handle(Command::CloseForm)?, Outcome::FormClosed);
    assert_eq!(controller.session(), &EditSession::Idle);

    // With the session closed and no map click, a submit cannot create anything.
    let result = controller.handle(Command::Submit(WorkoutInput::running(1.0, 5.0, 150.0)));
    assert!(matches!(result, Err(ControllerError::NoLocation)));

    assert_eq!(
        controller.handle(Command::Delete(id.clone()))?,
        Outcome::Deleted(id)
    );
    assert!(controller.store().is_empty());
    Ok(())
}

#[test]
fn test_controller_over_prefilled_adapter() -> Result<()> {
    let mut adapter = PersistenceAdapter::new(MemoryStorage::new());
    let workout = Workout::new(
        &WorkoutInput::running(10.0, 50.0, 170.0),
        Coords::new(4.0, 4.0),
        "1234567890",
        fixed_now(),
    )?;
    adapter.save(&[workout])?;

    let mut controller =
        mapty_lib::WorkoutController::new(adapter, common::RecordingView::default());
    assert_eq!(controller.restore(), 1);
    assert_eq!(controller.select("1234567890")?, 1);
    Ok(())
}
