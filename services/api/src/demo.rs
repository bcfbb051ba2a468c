use crate::infra::{load_catalog, parse_assignment, InMemorySubmissionSink};
use clap::{Args, Subcommand};
use devnet_forms::config::AppConfig;
use devnet_forms::error::AppError;
use devnet_forms::forms::{
    validate, ErrorMap, FieldKind, FieldValues, FormCatalog, FormSchema, FormSessionError,
    FormSessionService, FormSnapshot, SessionId, SubmissionOutcome, BOOKING_FORM,
};
use std::sync::Arc;

#[derive(Subcommand, Debug)]
pub(crate) enum FormsCommand {
    /// List the forms in the catalog
    List,
    /// Print one form schema as JSON
    Show {
        /// Form id (e.g. booking, hiring_request)
        form: String,
    },
}

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// Form id to validate against
    pub(crate) form: String,
    /// Field value as NAME=VALUE; repeat for each field
    #[arg(long = "value", value_parser = parse_assignment)]
    pub(crate) values: Vec<(String, String)>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print full JSON snapshots instead of the condensed view
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_forms(command: FormsCommand) -> Result<(), AppError> {
    let catalog = configured_catalog()?;
    match command {
        FormsCommand::List => {
            for schema in catalog.schemas() {
                println!("{} - {} ({} fields)", schema.id(), schema.title(), schema.fields().len());
            }
        }
        FormsCommand::Show { form } => {
            let schema = catalog
                .get(&form)
                .ok_or(FormSessionError::UnknownForm(form))?;
            print_json(schema.as_ref());
        }
    }
    Ok(())
}

pub(crate) fn run_validate(args: ValidateArgs) -> Result<(), AppError> {
    let catalog = configured_catalog()?;
    let report = validate_against(&catalog, args)?;

    if !report.ignored.is_empty() {
        println!(
            "Ignoring fields not in `{}`: {}",
            report.form,
            report.ignored.join(", ")
        );
    }
    if report.errors.is_empty() {
        println!("`{}` is valid", report.form);
    } else {
        println!("`{}` has {} invalid field(s)", report.form, report.errors.len());
    }
    print_json(&report.errors);
    Ok(())
}

/// Catalog the `serve` command would mount, honouring `APP_FORMS_CATALOG`.
fn configured_catalog() -> Result<FormCatalog, AppError> {
    let config = AppConfig::load()?;
    load_catalog(&config)
}

#[derive(Debug)]
struct ValidationReport {
    form: String,
    ignored: Vec<String>,
    errors: ErrorMap,
}

fn validate_against(catalog: &FormCatalog, args: ValidateArgs) -> Result<ValidationReport, AppError> {
    let schema = catalog
        .get(&args.form)
        .ok_or(FormSessionError::UnknownForm(args.form))?;

    let values: FieldValues = args.values.into_iter().collect();
    let ignored = values
        .keys()
        .filter(|name| !schema.contains(name))
        .cloned()
        .collect();

    Ok(ValidationReport {
        form: schema.id().to_string(),
        ignored,
        errors: validate(&schema, &values),
    })
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let catalog = Arc::new(FormCatalog::builtin()?);
    let sink = Arc::new(InMemorySubmissionSink::default());
    let service = FormSessionService::new(catalog, sink.clone());

    println!("Interview booking walkthrough");
    let view = service.open(BOOKING_FORM)?;
    let id = view.session_id;
    let schema = service
        .catalog()
        .get(BOOKING_FORM)
        .ok_or_else(|| FormSessionError::UnknownForm(BOOKING_FORM.to_string()))?;
    describe_schema(&schema);

    step(&args, "Visitor types a first name", {
        service.change(&id, "firstName", "Jane".to_string())?
    });
    step(&args, "Visitor leaves a malformed email", {
        service.change(&id, "email", "not-an-email".to_string())?;
        service.blur(&id, "email")?
    });

    let first_attempt = service.submit(&id)?;
    println!("\nSubmit clicked early -> {}", first_attempt.outcome.label());
    render(&args, &first_attempt.snapshot);

    for (field, value) in [
        ("lastName", "Doe"),
        ("email", "jane@doe.com"),
        ("github", "https://github.com/jane"),
        ("linkedin", "linkedin.com/in/jane"),
        ("howFound", "podcast"),
    ] {
        service.change(&id, field, value.to_string())?;
    }
    step(&args, "Visitor corrects every field", service.snapshot(&id)?);

    let receipt = service.submit(&id)?;
    println!("\nSubmit clicked -> {}", receipt.outcome.label());
    if let SubmissionOutcome::Accepted { values } = &receipt.outcome {
        print_json(values);
    }
    println!("Form reset for the next visitor:");
    render(&args, &receipt.snapshot);

    close_quietly(&service, &id);
    let records = sink.records();
    println!("\nSink holds {} submission(s)", records.len());
    for record in records {
        println!("  - {} with {} field(s)", record.form, record.values.len());
    }
    Ok(())
}

fn describe_schema(schema: &FormSchema) {
    println!("{} ({})", schema.title(), schema.id());
    for field in schema.fields() {
        let detail = match &field.kind {
            FieldKind::Text {
                max_length: Some(max),
            } => format!("text, max {max}"),
            FieldKind::Url { lenient: true } => "url, scheme optional".to_string(),
            FieldKind::Select { allowed_values } => format!(
                "select: {}",
                allowed_values.iter().cloned().collect::<Vec<_>>().join("|")
            ),
            other => other.label().to_string(),
        };
        let required = if field.required { "required" } else { "optional" };
        println!("  - {:<10} {:<28} {}", field.name, detail, required);
    }
}

fn step(args: &DemoArgs, title: &str, snapshot: FormSnapshot) {
    println!("\n{title}");
    render(args, &snapshot);
}

fn render(args: &DemoArgs, snapshot: &FormSnapshot) {
    if args.json {
        print_json(snapshot);
        return;
    }

    let filled = snapshot.values.values().filter(|value| !value.is_empty()).count();
    println!(
        "  filled {}/{} | touched {} | submit {}",
        filled,
        snapshot.values.len(),
        snapshot.touched.len(),
        if snapshot.is_valid { "enabled" } else { "disabled" }
    );
    for (field, message) in &snapshot.errors {
        println!("  ! {field}: {message}");
    }
}

fn close_quietly<S>(service: &FormSessionService<S>, id: &SessionId)
where
    S: devnet_forms::forms::SubmissionSink + 'static,
{
    if let Err(err) = service.close(id) {
        eprintln!("unable to close demo session: {err}");
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("unable to render JSON: {err}"),
    }
}
