mod common;

use std::sync::Arc;

use common::*;
use domain::{CommandValue, Device, DomainError, ProfileResource, ResourceOperation};

#[tokio::test]
async fn start_loads_metadata() {
    let h = start_service(Arc::new(MockDriver::lifecycle())).await;

    assert_eq!(h.service.status(), "pong");
    assert_eq!(h.service.name(), "tank-service");
    assert!(h.service.index().is_initialized());
    assert_eq!(h.service.device_profiles().await.len(), 1);
    assert_eq!(
        h.service.index().device_by_id(DEVICE_ID).await.unwrap().name,
        DEVICE
    );
}

#[tokio::test]
async fn second_start_is_ignored() {
    let mut driver = MockDriver::new();
    driver.expect_initialize().times(1).returning(|_| Ok(()));
    driver.expect_stop().times(1).returning(|_| Ok(()));
    let h = start_service(Arc::new(driver)).await;
    let first = h.service.async_sender().await.unwrap();

    h.service.start().await.unwrap();

    let second = h.service.async_sender().await.unwrap();
    assert!(first.same_channel(&second));
    h.service.stop(false).await;
}

#[tokio::test]
async fn add_device_requires_known_profile_and_unique_name() {
    let h = start_service(Arc::new(MockDriver::lifecycle())).await;

    let orphan = h
        .service
        .add_device(Device::new("x1", "pump-1", "pump"))
        .await
        .unwrap_err();
    assert!(matches!(orphan, DomainError::ProfileNotFound(_)));

    let duplicate = h
        .service
        .add_device(Device::new("x2", DEVICE, "tank"))
        .await
        .unwrap_err();
    assert!(matches!(duplicate, DomainError::AlreadyExists(_)));

    h.service
        .add_device(Device::new("x3", "tank-2", "tank"))
        .await
        .unwrap();
    assert_eq!(h.service.index().device_by_id("x3").await.unwrap().name, "tank-2");
}

#[tokio::test]
async fn remove_device_disconnects_driver() {
    let mut driver = MockDriver::lifecycle();
    driver
        .expect_disconnect_device()
        .withf(|addr| addr.name == DEVICE)
        .times(1)
        .returning(|_| Ok(()));
    let h = start_service(Arc::new(driver)).await;

    let removed = h.service.remove_device(DEVICE_ID).await.unwrap();
    assert_eq!(removed.name, DEVICE);

    let err = h.service.execute_get(DEVICE_ID, "Level").await.unwrap_err();
    assert!(matches!(err, DomainError::DeviceNotFound(_)));
    assert!(h.service.remove_device(DEVICE_ID).await.is_err());
}

#[tokio::test]
async fn profile_update_replaces_operations() {
    let mut driver = MockDriver::lifecycle();
    driver
        .expect_handle_get_commands()
        .withf(|_, reqs| reqs.len() == 1 && reqs[0].object_name() == "Temp")
        .times(1)
        .returning(|_, _| Ok(vec![CommandValue::new_f32("Temp", 0, 4.0)]));
    let h = start_service(Arc::new(driver)).await;

    let mut profile = tank_profile();
    for resource in profile.resources.iter_mut() {
        if resource.name == "Level" {
            *resource = ProfileResource {
                name: "Level".into(),
                get: vec![ResourceOperation::new("get", "Temp")],
                set: vec![],
            };
        }
    }
    h.service.update_device_profile(profile).await.unwrap();

    let outcome = h.service.execute_get(DEVICE_ID, "Level").await.unwrap();
    assert_eq!(outcome.event.readings[0].name, "Temp");
    assert_eq!(outcome.event.readings[0].value, "4");
}

#[tokio::test]
async fn managed_profiles() {
    let h = start_service(Arc::new(MockDriver::lifecycle())).await;

    let duplicate = h.service.add_device_profile(tank_profile()).await;
    assert!(matches!(duplicate, Err(DomainError::AlreadyExists(_))));

    let removed = h.service.remove_device_profile("tank").await.unwrap();
    assert_eq!(removed.name, "tank");
    assert!(h.service.device_profiles().await.is_empty());

    let err = h.service.execute_get(DEVICE_ID, "Level").await.unwrap_err();
    assert!(matches!(err, DomainError::ProfileNotFound(_)));

    h.service.add_device_profile(tank_profile()).await.unwrap();
    assert_eq!(h.service.device_profiles().await.len(), 1);
}

#[tokio::test]
async fn data_transform_switch_disables_numeric_step_only() {
    let mut driver = MockDriver::lifecycle();
    driver.expect_handle_get_commands().returning(|_, _| {
        Ok(vec![
            CommandValue::new_i32("Level", 0, 3),
            CommandValue::new_u8("Switch", 0, 0),
            CommandValue::new_f32("Temp", 0, 20.0),
        ])
    });
    let mut settings = settings();
    settings.data_transform = false;
    let h = start_service_with(Arc::new(driver), settings, vec![tank_device()]).await;

    let outcome = h.service.execute_get(DEVICE_ID, "Overview").await.unwrap();

    assert_eq!(outcome.event.reading("Level").unwrap().value, "3");
    assert_eq!(outcome.event.reading("Switch").unwrap().value, "OFF");
}
