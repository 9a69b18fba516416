mod common;

use anyhow::Result as AnyResult;
use common::{Appointment, Harness, Order, Pet, seconds_from_now};
use reactor_core::error::ReactorError;
use reactor_core::publishable::{PublishRule, Publisher, PublisherRegistry};
use reactor_core::reactor::{Fired, JobOutcome};
use reactor_core::reference::Reference;
use reactor_core::resolver::Resolver;

fn pet_publishers() -> PublisherRegistry {
    PublisherRegistry::new().register(
        Publisher::<Pet>::new()
            .publishes(
                PublishRule::new("pet_created")
                    .target_self()
                    .data("additional_info", "woof"),
            )
            .publishes(PublishRule::new("pet_woke").fire_if("awake"))
            .publishes(PublishRule::new("pet_ignored").enqueue_if(Resolver::inline(|_: &Pet| Ok(false)))),
    )
}

fn appointment_publishers() -> PublisherRegistry {
    PublisherRegistry::new().register(
        Publisher::<Appointment>::new().publishes(
            PublishRule::new("appointment_started")
                .actor(Resolver::inline(|a: &Appointment| {
                    Ok(Some(Reference::new("Pet", a.pet_id.to_string())))
                }))
                .target_self()
                .watch("start_at")
                .at("start_at"),
        ),
    )
}

#[tokio::test]
async fn creating_an_entity_publishes_its_create_rules() -> AnyResult<()> {
    let h = Harness::builder().publishers(pet_publishers()).build();

    h.repository::<Pet>().create(Pet::new(1, "Rex")).await?;

    assert_eq!(h.ready_events(), ["pet_created", "pet_woke"]);

    let jobs = h.queue.ready_jobs();
    let created = jobs[0].data();
    assert_eq!(created.get_str("actor_type"), Some("Pet"));
    assert_eq!(created.get_str("actor_id"), Some("1"));
    assert_eq!(created.get_str("target_type"), Some("Pet"));
    assert_eq!(created.get_str("additional_info"), Some("woof"));
    assert!(created.get_str("uuid").is_some());

    let outcomes = h.queue.drain(&h.reactor).await?;
    assert_eq!(
        outcomes,
        vec![
            JobOutcome::Event(Fired::Dispatched { handlers: 0 }),
            JobOutcome::Event(Fired::Dispatched { handlers: 0 }),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn fire_condition_is_checked_against_the_latest_entity() -> AnyResult<()> {
    let h = Harness::builder().publishers(pet_publishers()).build();
    let pets = h.repository::<Pet>();

    pets.create(Pet::new(1, "Rex")).await?;
    pets.modify(&1, |pet| pet.awake = false).await?;

    let outcomes = h.queue.drain(&h.reactor).await?;
    assert_eq!(
        outcomes,
        vec![
            JobOutcome::Event(Fired::Dispatched { handlers: 0 }),
            JobOutcome::Event(Fired::Dropped),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn watched_attribute_publishes_to_and_from_absent() -> AnyResult<()> {
    let publishers = PublisherRegistry::new().register(
        Publisher::<Order>::new().publishes(PublishRule::new("order_status_changed").watch("status")),
    );
    let h = Harness::builder().publishers(publishers).build();
    let orders = h.repository::<Order>();

    orders.create(Order { id: 9, status: None }).await?;
    assert!(h.ready_events().is_empty());

    orders
        .modify(&9, |o| o.status = Some("shipped".to_string()))
        .await?;
    assert_eq!(h.ready_events(), ["order_status_changed"]);

    orders.modify(&9, |o| o.status = None).await?;
    orders.modify(&9, |o| o.status = None).await?;
    assert_eq!(h.ready_events(), ["order_status_changed", "order_status_changed"]);
    Ok(())
}

#[tokio::test]
async fn updating_a_missing_entity_is_not_found() {
    let h = Harness::builder().build();
    let err = h
        .repository::<Order>()
        .update(Order { id: 404, status: None })
        .await
        .unwrap_err();
    assert!(matches!(err, ReactorError::NotFound { .. }));
}

#[tokio::test]
async fn rescheduling_moves_the_scheduled_event() -> AnyResult<()> {
    let h = Harness::builder().publishers(appointment_publishers()).build();
    h.repository::<Pet>().create(Pet::new(7, "Rex")).await?;
    let appointments = h.repository::<Appointment>();

    let t1 = seconds_from_now(3_600);
    let t2 = seconds_from_now(7_200);

    appointments
        .create(Appointment {
            id: 1,
            pet_id: 7,
            start_at: Some(t1),
        })
        .await?;
    let scheduled = h.queue.scheduled_jobs();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].scheduled_at, t1);
    assert!(!scheduled[0].job.data().contains_key("was"));

    appointments.modify(&1, |a| a.start_at = Some(t2)).await?;
    let scheduled = h.queue.scheduled_jobs();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].scheduled_at, t2);
    assert_eq!(scheduled[0].job.data().get_str("actor_id"), Some("7"));
    assert!(!scheduled[0].job.data().contains_key("was"));
    assert!(h.ready_events().is_empty());

    assert_eq!(h.queue.promote_due(t2), 1);
    let outcomes = h.queue.drain(&h.reactor).await?;
    assert_eq!(outcomes, vec![JobOutcome::Event(Fired::Dispatched { handlers: 0 })]);
    Ok(())
}

#[tokio::test]
async fn clearing_the_time_cancels_without_republishing() -> AnyResult<()> {
    let h = Harness::builder().publishers(appointment_publishers()).build();
    let appointments = h.repository::<Appointment>();

    appointments
        .create(Appointment {
            id: 2,
            pet_id: 7,
            start_at: Some(seconds_from_now(600)),
        })
        .await?;
    assert_eq!(h.queue.scheduled_jobs().len(), 1);

    appointments.modify(&2, |a| a.start_at = None).await?;
    assert!(h.queue.scheduled_jobs().is_empty());
    assert!(h.ready_events().is_empty());
    Ok(())
}

#[tokio::test]
async fn vanished_actor_fails_the_event_job() -> AnyResult<()> {
    let h = Harness::builder().publishers(appointment_publishers()).build();

    h.repository::<Appointment>()
        .create(Appointment {
            id: 3,
            pet_id: 99,
            start_at: Some(seconds_from_now(60)),
        })
        .await?;
    h.queue.promote_due(seconds_from_now(120));

    let err = h.queue.drain(&h.reactor).await.unwrap_err();
    assert!(matches!(err, ReactorError::NotFound { .. }));
    Ok(())
}
