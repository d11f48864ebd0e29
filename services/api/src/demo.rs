use crate::infra::{InMemoryGovStore, InMemoryNotificationHub, InMemoryProfileDirectory};
use egov_services::error::AppError;
use egov_services::workflows::applications::{
    ApplicantProfile, ApplicationLifecycleService, NewDocument, UserId,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Drive a full lifecycle on the in-memory stack and print each stage, for
/// stakeholder walkthroughs without a running server.
pub(crate) fn run_demo() -> Result<(), AppError> {
    let store = Arc::new(InMemoryGovStore::default());
    let hub = Arc::new(InMemoryNotificationHub::default());
    let profiles = Arc::new(InMemoryProfileDirectory::default());
    let service = ApplicationLifecycleService::new(store, hub.clone(), profiles.clone());

    let citizen = UserId(Uuid::new_v4());
    profiles.seed(
        citizen,
        ApplicantProfile {
            full_name: "Thandi Mokoena".to_string(),
            email: "thandi@example.org".to_string(),
            phone: "+27 82 555 0100".to_string(),
            id_number: "8001015009087".to_string(),
        },
    );

    println!("== Submit a passport application ==");
    let submitted = service
        .submit(citizen, "passport", json!({ "travel_reason": "work" }))
        .map_err(AppError::from)?;
    print_json(&submitted)?;
    let id = submitted.application.id;

    println!("\n== Attach supporting documents ==");
    let document = service
        .add_document(
            &id,
            NewDocument {
                document_type: "photo".to_string(),
                file_name: "id-photo.jpg".to_string(),
                file_url: "https://files.egov.example/id-photo.jpg".to_string(),
                file_size: Some(204_800),
            },
        )
        .map_err(AppError::from)?;
    print_json(&document)?;

    println!("\n== Move under review, then approve ==");
    service
        .update_status(
            &id,
            "Under Review",
            Some("Interview scheduled".to_string()),
            Some("assigned to case worker".to_string()),
        )
        .map_err(AppError::from)?;
    let approved = service
        .approve(&id, Some("all documents verified".to_string()))
        .map_err(AppError::from)?;
    print_json(&approved)?;

    println!("\n== Status history (newest first) ==");
    print_json(&service.history(&id).map_err(AppError::from)?)?;

    println!("\n== Admin view with applicant details ==");
    print_json(&service.admin_view(&id).map_err(AppError::from)?)?;

    println!("\n== Citizen notification inbox ==");
    print_json(&hub.notifications_for(&citizen))?;

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, err)))?;
    println!("{rendered}");
    Ok(())
}
