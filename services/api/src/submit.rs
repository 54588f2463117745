use crate::infra::{InMemoryApplicationStore, LoggingNotifier};
use clap::Args;
use job_intake::applications::{
    ApplicantNotifier, ApplicationIntakeService, ApplicationStore, RawSubmission, SmtpNotifier,
    SqlApplicationStore, SubmissionOutcome,
};
use job_intake::config::AppConfig;
use job_intake::error::AppError;
use job_intake::telemetry;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct SubmitArgs {
    #[arg(long)]
    pub(crate) first_name: String,
    #[arg(long)]
    pub(crate) last_name: String,
    #[arg(long)]
    pub(crate) email: String,
    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    pub(crate) date_of_birth: String,
    #[arg(long)]
    pub(crate) education_degree: String,
    /// Whole years of experience (defaults to 0)
    #[arg(long)]
    pub(crate) experience_years: Option<String>,
    #[arg(long)]
    pub(crate) current_organization: Option<String>,
    #[arg(long)]
    pub(crate) current_ctc: Option<String>,
    #[arg(long)]
    pub(crate) expected_ctc: Option<String>,
    #[arg(long)]
    pub(crate) notice_period: Option<String>,
    /// Path to the résumé PDF
    #[arg(long)]
    pub(crate) resume: PathBuf,
    /// Keep the application in memory and log the confirmation instead of emailing it
    #[arg(long)]
    pub(crate) dry_run: bool,
}

impl SubmitArgs {
    fn into_submission(self, resume: Vec<u8>) -> RawSubmission {
        let mut raw = RawSubmission::new()
            .with("first_name", self.first_name)
            .with("last_name", self.last_name)
            .with("email", self.email)
            .with("date_of_birth", self.date_of_birth)
            .with("education_degree", self.education_degree)
            .with_resume(resume);

        for (key, value) in [
            ("experience_years", self.experience_years),
            ("current_organization", self.current_organization),
            ("current_ctc", self.current_ctc),
            ("expected_ctc", self.expected_ctc),
            ("notice_period", self.notice_period),
        ] {
            if let Some(value) = value {
                raw.set(key, value);
            }
        }
        raw
    }
}

/// One-shot submission. Exits non-zero when the application was not stored.
pub(crate) async fn run_submit(args: SubmitArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let resume = std::fs::read(&args.resume)?;
    let dry_run = args.dry_run;
    let submission = args.into_submission(resume);

    let outcome = if dry_run {
        submit_with(
            InMemoryApplicationStore::default(),
            LoggingNotifier,
            submission,
        )
        .await
    } else {
        submit_with(
            SqlApplicationStore::new(&config.database),
            SmtpNotifier::new(&config.mail),
            submission,
        )
        .await
    };

    report(&outcome)
}

async fn submit_with<S, N>(store: S, notifier: N, submission: RawSubmission) -> SubmissionOutcome
where
    S: ApplicationStore + 'static,
    N: ApplicantNotifier + 'static,
{
    ApplicationIntakeService::new(Arc::new(store), Arc::new(notifier))
        .submit(submission)
        .await
}

fn report(outcome: &SubmissionOutcome) -> Result<(), AppError> {
    match serde_json::to_string_pretty(&outcome.view()) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("outcome: {} ({err})", outcome.kind().label()),
    }

    let kind = outcome.kind();
    if kind.is_stored() {
        Ok(())
    } else {
        Err(AppError::Submission(kind))
    }
}
