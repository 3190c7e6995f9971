//! Racing decisions over the same bed or request.

use crate::support::{
    admin, admit_patient, assert_allocation_consistent, doctor, seed_ward, submit_request,
    with_test_app, SeededWard,
};
use futures::future::join_all;
use uuid::Uuid;
use wardflow::{AppState, Error};
use wardflow_models::{BedAssignment, RejectAdmission, RequestTransfer};

fn assignment(ward: &SeededWard, bed_index: usize) -> BedAssignment {
    BedAssignment {
        ward_id: ward.ward_id,
        room_id: ward.room_id,
        bed_id: ward.bed_ids[bed_index],
    }
}

async fn spawn_approvals(
    state: &AppState,
    attempts: Vec<(Uuid, BedAssignment)>,
) -> anyhow::Result<Vec<wardflow::Result<()>>> {
    let handles = attempts.into_iter().map(|(request_id, placement)| {
        let state = state.clone();
        tokio::spawn(async move {
            state
                .admissions
                .approve(&admin(), request_id, placement)
                .await
                .map(|_| ())
        })
    });
    let mut results = Vec::new();
    for joined in join_all(handles).await {
        results.push(joined?);
    }
    Ok(results)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_approvals_for_one_bed() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let ward = seed_ward(app, "Acute Medicine", 1).await?;
            let first = submit_request(app, &doctor(), Uuid::new_v4(), "normal").await?;
            let second = submit_request(app, &doctor(), Uuid::new_v4(), "emergency").await?;

            let results = spawn_approvals(
                &app.state,
                vec![(first, assignment(&ward, 0)), (second, assignment(&ward, 0))],
            )
            .await?;

            let won = results.iter().filter(|r| r.is_ok()).count();
            let lost = results
                .iter()
                .filter(|r| matches!(r, Err(Error::InvalidState(_))))
                .count();
            assert_eq!((won, lost), (1, 1), "results: {results:?}");
            assert_allocation_consistent(&app.state).await?;

            Ok(())
        })
    })
    .await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_approvals_over_few_beds() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let ward = seed_ward(app, "Emergency Overflow", 3).await?;
            let mut attempts = Vec::new();
            for n in 0..9 {
                let request_id = submit_request(app, &doctor(), Uuid::new_v4(), "normal").await?;
                attempts.push((request_id, assignment(&ward, n % 3)));
            }

            let results = spawn_approvals(&app.state, attempts).await?;
            let won = results.iter().filter(|r| r.is_ok()).count();
            assert_eq!(won, 3, "one approval per bed: {results:?}");
            assert!(results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| matches!(e, Error::InvalidState(_))));

            let pending = app
                .state
                .admissions
                .list(&Default::default())
                .await?;
            assert_eq!(pending.len(), 6);
            assert_allocation_consistent(&app.state).await?;

            Ok(())
        })
    })
    .await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn transfer_and_approval_race_for_a_bed() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let ward = seed_ward(app, "Cardiac Step-down", 2).await?;
            let stay_id = admit_patient(app, Uuid::new_v4(), ward.placement(0)).await?;
            app.state
                .stays
                .request_transfer(
                    &doctor(),
                    stay_id,
                    RequestTransfer {
                        reason: "Telemetry bed".to_string(),
                        suggested_ward_id: None,
                    },
                )
                .await?;
            let request_id = submit_request(app, &doctor(), Uuid::new_v4(), "emergency").await?;

            let target = assignment(&ward, 1);
            let transfer = {
                let state = app.state.clone();
                tokio::spawn(async move {
                    state
                        .stays
                        .complete_transfer(&admin(), stay_id, target)
                        .await
                        .map(|_| ())
                })
            };
            let approval = {
                let state = app.state.clone();
                tokio::spawn(async move {
                    state
                        .admissions
                        .approve(&admin(), request_id, target)
                        .await
                        .map(|_| ())
                })
            };
            let (transfer, approval) = (transfer.await?, approval.await?);

            assert!(
                transfer.is_ok() != approval.is_ok(),
                "exactly one may take the bed: {transfer:?} / {approval:?}"
            );
            for loser in [&transfer, &approval].into_iter().filter_map(|r| r.as_ref().err()) {
                assert!(matches!(loser, Error::InvalidState(_)), "{loser:?}");
            }
            assert_allocation_consistent(&app.state).await?;

            Ok(())
        })
    })
    .await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn approve_and_reject_race_on_one_request() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let ward = seed_ward(app, "Short Stay", 1).await?;
            let request_id = submit_request(app, &doctor(), Uuid::new_v4(), "normal").await?;

            let approve = {
                let state = app.state.clone();
                let placement = assignment(&ward, 0);
                tokio::spawn(async move {
                    state
                        .admissions
                        .approve(&admin(), request_id, placement)
                        .await
                        .map(|_| ())
                })
            };
            let reject = {
                let state = app.state.clone();
                tokio::spawn(async move {
                    state
                        .admissions
                        .reject(
                            &admin(),
                            request_id,
                            RejectAdmission {
                                reason: "No capacity".to_string(),
                            },
                        )
                        .await
                        .map(|_| ())
                })
            };
            let (approve, reject) = (approve.await?, reject.await?);

            assert!(approve.is_ok() != reject.is_ok(), "{approve:?} / {reject:?}");
            for loser in [&approve, &reject].into_iter().filter_map(|r| r.as_ref().err()) {
                assert!(matches!(loser, Error::NotFound(_)), "{loser:?}");
            }

            let request = app.state.admissions.get(request_id).await?;
            let bed = app.state.facility.get_bed(ward.bed_ids[0]).await?;
            assert_eq!(
                request.stay_id.is_some(),
                bed.status == wardflow_models::BedStatus::Occupied
            );
            assert_allocation_consistent(&app.state).await?;

            Ok(())
        })
    })
    .await
}
