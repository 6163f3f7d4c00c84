use crossterm::style::{style, Stylize};
use tracing::{debug, info, warn};

use crate::activity::{new_event, ActivityLog};
use crate::error::SyncError;
use crate::prompt::{Answer, Confirm};
use crate::readers::RowReader;
use crate::sync::table::SyncTable;
use crate::tracker::{IssueLink, TrackerClient};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub existing: usize,
    pub declined: usize,
}

/// Whether `links` (taken from the dependency) already say that it
/// `relationship` the issue `dependent_key`.
///
/// Links with no outward end are the inverse side of some relationship and
/// never match.
pub fn has_link(links: &[IssueLink], relationship: &str, dependent_key: &str) -> bool {
    links.iter().any(|link| {
        link.relationship == relationship
            && link.outward_key.as_deref() == Some(dependent_key)
    })
}

/// Make sure every synchronized issue is linked from each of its
/// dependencies: `dependency --relationship--> issue`.
///
/// Pairs that are already linked are left alone, so running this twice
/// creates nothing the second time.
pub async fn reconcile(
    tracker: &dyn TrackerClient,
    reader: &dyn RowReader,
    table: &SyncTable,
    relationship: &str,
    confirm: &dyn Confirm,
    activity: Option<&ActivityLog>,
) -> Result<ReconcileReport, SyncError> {
    let mut report = ReconcileReport::default();

    for (descriptor, issue) in table.synchronized() {
        let dependencies = reader
            .resolve_dependencies(tracker, descriptor, table)
            .await;

        for dependency in dependencies {
            if dependency.key == issue.key {
                debug!(key = %issue.key, "issue listed as its own dependency, skipping");
                continue;
            }
            let links = tracker
                .issue_links(&dependency.key)
                .await
                .map_err(|e| {
                    SyncError::tracker(&descriptor.id, format!("list links of {}", dependency.key), e)
                })?;

            if has_link(&links, relationship, &issue.key) {
                debug!(from = %dependency.key, to = %issue.key, relationship, "already linked");
                report.existing += 1;
                continue;
            }

            let prompt = format!(
                "Create relationship {} {} {}?",
                style(format!("\"{}\" ({})", dependency.summary, dependency.key)).underlined(),
                style(relationship).bold(),
                style(format!("\"{}\" ({})", issue.summary, descriptor.id)).underlined(),
            );
            match confirm.confirm(&prompt).await {
                Answer::Yes => {
                    tracker
                        .create_link(relationship, &dependency.key, &issue.key)
                        .await
                        .map_err(|e| {
                            SyncError::tracker(
                                &descriptor.id,
                                format!("link {} to {}", dependency.key, issue.key),
                                e,
                            )
                        })?;
                    info!(from = %dependency.key, to = %issue.key, relationship, "created link");
                    report.created += 1;
                    if let Some(activity) = activity {
                        let message = format!("{} {relationship} {}", dependency.key, issue.key);
                        activity.record(new_event(
                            "linked",
                            &issue.key,
                            Some(&descriptor.id),
                            Some(&message),
                        ));
                    }
                }
                Answer::No => report.declined += 1,
                Answer::Interrupted => {
                    warn!("interrupted; no further links will be created");
                    return Ok(report);
                }
            }
        }
    }

    Ok(report)
}
