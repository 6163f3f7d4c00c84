pub mod fields;
pub mod table;


use std::path::Path;

use crossterm::style::{style, Stylize};
use tracing::{debug, info, warn};

use crate::activity::{new_event, ActivityEvent, ActivityLog};
use crate::config::DEFAULT_SIZE_FIELD;
use crate::error::SyncError;
use crate::interrupt::Interrupt;
use crate::model::descriptor::{IssueDescriptor, JIRA_ID_FIELD};
use crate::prompt::{Answer, Confirm};
use crate::readers::RowReader;
use crate::reconcile::{reconcile, ReconcileReport};
use crate::sheet::{temp_path, Sheet};
use crate::tracker::{FieldSet, RemoteIssue, TrackerClient};
use fields::build_fields;
use table::SyncTable;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub issue_type_default: String,
    pub relationship: String,
    pub labels_to_add: Vec<String>,
    /// Applied last, in order; they replace any field set before them.
    pub field_overrides: Vec<(String, String)>,
    /// When false, nothing is created or updated; existing keys are still
    /// fetched and linked.
    pub create_or_update: bool,
    pub size_field: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            issue_type_default: "Story".into(),
            relationship: "Blocks".into(),
            labels_to_add: Vec::new(),
            field_overrides: Vec::new(),
            create_or_update: true,
            size_field: DEFAULT_SIZE_FIELD.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub rows: usize,
    pub created: usize,
    pub updated: usize,
    pub fetched: usize,
    /// Rows that bypassed the tracker because the run was aborted.
    pub skipped: usize,
    pub aborted: bool,
    pub links: ReconcileReport,
}

enum Flow {
    Continue,
    SkipRest,
}

pub struct SyncEngine<'a> {
    tracker: &'a dyn TrackerClient,
    reader: &'a dyn RowReader,
    confirm: &'a dyn Confirm,
    interrupt: Interrupt,
    activity: Option<ActivityLog>,
}

impl<'a> SyncEngine<'a> {
    pub fn new(
        tracker: &'a dyn TrackerClient,
        reader: &'a dyn RowReader,
        confirm: &'a dyn Confirm,
    ) -> Self {
        Self {
            tracker,
            reader,
            confirm,
            interrupt: Interrupt::default(),
            activity: None,
        }
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn with_activity_log(mut self, activity: ActivityLog) -> Self {
        self.activity = Some(activity);
        self
    }

    /// Create or update one issue per row of `path`, write the keys back
    /// into the file, then link dependencies.
    ///
    /// The file is rewritten through a sibling temp file and renamed into
    /// place only after every row has been written; any error before that
    /// leaves the original untouched.
    pub async fn synchronize(
        &self,
        path: &Path,
        project: &str,
        options: &SyncOptions,
    ) -> Result<SyncReport, SyncError> {
        let sheet = Sheet::read(path)?;
        let headers = sheet.output_headers();
        let tmp = temp_path(path);

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&tmp)
            .map_err(|e| SyncError::csv(&tmp, e))?;
        writer
            .write_record(&headers)
            .map_err(|e| SyncError::csv(&tmp, e))?;
        writer.flush().map_err(|e| SyncError::io(&tmp, e))?;

        let mut table = SyncTable::new();
        let mut report = SyncReport::default();
        let mut skip_all = false;

        for sheet_row in sheet.rows {
            let mut row = sheet_row.row;
            let descriptor = self
                .reader
                .interpret(&row)
                .map_err(|source| SyncError::MalformedRow {
                    line: sheet_row.line,
                    source,
                })?;
            report.rows += 1;

            if !skip_all && self.interrupt.is_raised() {
                warn!(id = %descriptor.id, "interrupted; remaining rows will not be synchronized");
                skip_all = true;
                report.aborted = true;
            }

            let remote = if skip_all {
                debug!(id = %descriptor.id, "skipping tracker");
                report.skipped += 1;
                None
            } else {
                let fields = build_fields(
                    &descriptor,
                    project,
                    &options.issue_type_default,
                    &options.labels_to_add,
                    &options.size_field,
                    &options.field_overrides,
                );
                let (remote, flow) = self
                    .sync_row(&descriptor, &fields, options, &mut report)
                    .await?;
                if let Flow::SkipRest = flow {
                    skip_all = true;
                    report.aborted = true;
                }
                remote
            };

            let key = remote
                .as_ref()
                .map(|r| r.key.clone())
                .or_else(|| descriptor.jira_id.clone())
                .unwrap_or_default();
            row.set(JIRA_ID_FIELD, key);
            writer
                .write_record(row.values_for(&headers))
                .map_err(|e| SyncError::csv(&tmp, e))?;
            writer.flush().map_err(|e| SyncError::io(&tmp, e))?;

            table.insert(descriptor, remote);
        }
        drop(writer);

        std::fs::rename(&tmp, path).map_err(|e| SyncError::io(path, e))?;
        info!(path = %path.display(), rows = report.rows, "spreadsheet updated");

        report.links = reconcile(
            self.tracker,
            self.reader,
            &table,
            &options.relationship,
            self.confirm,
            self.activity.as_ref(),
        )
        .await?;
        Ok(report)
    }

    async fn sync_row(
        &self,
        descriptor: &IssueDescriptor,
        fields: &FieldSet,
        options: &SyncOptions,
        report: &mut SyncReport,
    ) -> Result<(Option<RemoteIssue>, Flow), SyncError> {
        let id = descriptor.id.as_str();
        let label = style(format!("\"{}\" ({id})", descriptor.summary)).underlined();

        let Some(key) = descriptor.jira_id.as_deref() else {
            if !options.create_or_update {
                return Ok((None, Flow::Continue));
            }
            return match self.confirm.confirm(&format!("Create issue for {label}?")).await {
                Answer::Yes => {
                    let issue = self
                        .tracker
                        .create_issue(fields)
                        .await
                        .map_err(|e| SyncError::tracker(id, "create issue", e))?;
                    info!(id, key = %issue.key, "created issue");
                    report.created += 1;
                    self.record(new_event("created", &issue.key, Some(id), None));
                    Ok((Some(issue), Flow::Continue))
                }
                Answer::No | Answer::Interrupted => {
                    warn!(id, "creation not confirmed; remaining rows will not be synchronized");
                    Ok((None, Flow::SkipRest))
                }
            };
        };

        let issue = self
            .tracker
            .fetch_issue(key)
            .await
            .map_err(|e| SyncError::tracker(id, format!("fetch {key}"), e))?;
        report.fetched += 1;
        if !options.create_or_update {
            return Ok((Some(issue), Flow::Continue));
        }

        let prompt = format!("Update {} for {label}?", style(key).bold());
        match self.confirm.confirm(&prompt).await {
            Answer::Yes => {
                self.tracker
                    .update_issue(key, &fields.without("project"))
                    .await
                    .map_err(|e| SyncError::tracker(id, format!("update {key}"), e))?;
                info!(id, key, "updated issue");
                report.updated += 1;
                self.record(new_event("updated", key, Some(id), None));
                Ok((Some(issue), Flow::Continue))
            }
            Answer::No => {
                debug!(id, key, "update declined");
                Ok((Some(issue), Flow::Continue))
            }
            Answer::Interrupted => Ok((Some(issue), Flow::SkipRest)),
        }
    }

    fn record(&self, event: ActivityEvent) {
        if let Some(activity) = &self.activity {
            activity.record(event);
        }
    }
}
