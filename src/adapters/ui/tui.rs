//! Implements InputPort. Inquire-based interactive menus.
//!
//! Main menu: check in, admin sign in/out, live activity log, driver roster.
//! inquire blocks, so every prompt runs on the blocking pool.

use crate::adapters::ui::render;
use crate::domain::{CheckInRequest, DomainError, Driver, DriverInput, Notification, User};
use crate::ports::{IdentityPort, InputPort};
use crate::usecases::{ActivityLogService, CheckInService, DriverService, Subscription};
use async_trait::async_trait;
use crossterm::ExecutableCommand;
use crossterm::cursor::MoveTo;
use crossterm::terminal::{Clear, ClearType};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::validator::Validation;
use inquire::{Confirm, InquireError, Select, Text};
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const CHECK_IN: &str = "Check in";
const ACTIVITY_LOG: &str = "Activity log (live)";
const DELETE_LOG: &str = "Delete a log entry";
const MANAGE_DRIVERS: &str = "Manage drivers";
const SIGN_IN: &str = "Admin sign in";
const SIGN_OUT: &str = "Sign out";
const EXIT: &str = "Exit";

const ADD_DRIVER: &str = "Add driver";
const EDIT_DRIVER: &str = "Edit driver";
const DELETE_DRIVER: &str = "Delete driver";
const WATCH_DRIVERS: &str = "Watch roster (live)";
const BACK: &str = "Back";

/// Run a blocking inquire prompt off the async runtime. Esc/Ctrl-C yields `None`.
async fn prompt<T, F>(f: F) -> Result<Option<T>, DomainError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, InquireError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DomainError::Ui(e.to_string()))?
    {
        Ok(v) => Ok(Some(v)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(DomainError::Ui(e.to_string())),
    }
}

fn min_chars(
    min: usize,
    message: &'static str,
) -> impl Fn(&str) -> Result<Validation, inquire::CustomUserError> + Clone {
    move |s: &str| {
        if s.trim().chars().count() >= min {
            Ok(Validation::Valid)
        } else {
            Ok(Validation::Invalid(message.into()))
        }
    }
}

fn report(e: &DomainError) {
    match e {
        DomainError::Validation(fields) => {
            let lines: Vec<String> = fields.iter().map(|f| f.message.clone()).collect();
            render::print_error("Please fix the form", &lines.join(" "));
        }
        DomainError::AccessDenied(msg) => render::print_error("Access denied", msg),
        other => render::print_error("Something went wrong", &other.to_string()),
    }
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    identity: Arc<dyn IdentityPort>,
    check_in: Arc<CheckInService>,
    activity_log: Arc<ActivityLogService>,
    drivers: Arc<DriverService>,
    /// Show a spinner while waiting for a reading (off when the source itself prompts).
    spinner: bool,
}

impl TuiInputPort {
    pub fn new(
        identity: Arc<dyn IdentityPort>,
        check_in: Arc<CheckInService>,
        activity_log: Arc<ActivityLogService>,
        drivers: Arc<DriverService>,
        spinner: bool,
    ) -> Self {
        Self {
            identity,
            check_in,
            activity_log,
            drivers,
            spinner,
        }
    }

    async fn main_menu(&self, user: Option<&User>) -> Result<Option<&'static str>, DomainError> {
        let mut options = vec![CHECK_IN];
        match user {
            Some(u) => {
                options.push(ACTIVITY_LOG);
                if self.drivers.is_admin(Some(u)) {
                    options.push(DELETE_LOG);
                    options.push(MANAGE_DRIVERS);
                }
                options.push(SIGN_OUT);
            }
            None => options.push(SIGN_IN),
        }
        options.push(EXIT);
        let title = match user.and_then(|u| u.email.clone()) {
            Some(email) => format!("Menu ({})", email),
            None => "Menu".to_string(),
        };
        prompt(move || Select::new(&title, options).prompt()).await
    }

    async fn run_check_in(&self) -> Result<(), DomainError> {
        let Some(name) = prompt(|| {
            Text::new("Full name:")
                .with_placeholder("e.g. João da Silva")
                .with_validator(min_chars(2, "Name must be at least 2 characters."))
                .prompt()
        })
        .await?
        else {
            return Ok(());
        };
        let Some(employee_id) = prompt(|| {
            Text::new("Employee ID:")
                .with_placeholder("e.g. SPX123456")
                .with_validator(min_chars(1, "Employee ID is required."))
                .prompt()
        })
        .await?
        else {
            return Ok(());
        };

        let spinner = self.spinner.then(|| {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
                pb.set_style(style);
            }
            pb.set_message("Verifying location...");
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });
        let result = self
            .check_in
            .check_in(&CheckInRequest::new(name, employee_id))
            .await;
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        let outcome = result?;
        render::print_notification(&outcome.notification);
        if outcome.log_error.is_some() {
            render::print_error(
                "Could not save",
                "The check-in record could not be saved to the database.",
            );
        }
        Ok(())
    }

    /// Redraw on every snapshot until the user presses Enter.
    async fn live_view<T>(
        &self,
        title: &str,
        mut sub: Subscription<T>,
        draw: fn(&[T]) -> String,
    ) -> Result<(), DomainError> {
        let mut enter = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            let _ = std::io::stdin().read_line(&mut line);
        });
        loop {
            tokio::select! {
                _ = &mut enter => break,
                snapshot = sub.next() => match snapshot {
                    Some(Ok(items)) => {
                        let mut out = stdout();
                        let _ = out.execute(Clear(ClearType::All));
                        let _ = out.execute(MoveTo(0, 0));
                        render::print_heading(title);
                        print!("{}", draw(&items));
                        println!("\n(updates live; press Enter to go back)");
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "live view failed");
                        report(&e);
                    }
                    None => {
                        let _ = (&mut enter).await;
                        break;
                    }
                },
            }
        }
        sub.unsubscribe();
        Ok(())
    }

    async fn delete_log_entry(&self, user: &User) -> Result<(), DomainError> {
        let entries = self.activity_log.recent(Some(user), 50).await?;
        if entries.is_empty() {
            print!("{}", render::log_table(&entries));
            return Ok(());
        }
        let labels: Vec<String> = entries
            .iter()
            .map(|l| {
                format!(
                    "{} · {} ({}) · {} · {}",
                    l.timestamp.format("%Y-%m-%d %H:%M"),
                    l.name,
                    l.employee_id,
                    l.status,
                    l.details
                )
            })
            .collect();
        let Some(choice) = prompt(move || {
            Select::new("Entry to delete:", labels).raw_prompt()
        })
        .await?
        else {
            return Ok(());
        };
        let entry = &entries[choice.index];
        let confirmed = prompt(|| {
            Confirm::new("Delete this entry permanently?")
                .with_default(false)
                .prompt()
        })
        .await?
        .unwrap_or(false);
        if confirmed {
            self.activity_log.delete(Some(user), &entry.id).await?;
            render::print_notification(&Notification::info("Log entry deleted.", None));
        }
        Ok(())
    }

    async fn driver_form(existing: Option<&Driver>) -> Result<Option<DriverInput>, DomainError> {
        let initial = existing.map(Driver::input).unwrap_or(DriverInput {
            name: String::new(),
            employee_id: String::new(),
            vehicle: String::new(),
            plate: String::new(),
        });
        let fields: [(&'static str, &'static str, String, usize, &'static str); 4] = [
            (
                "Full name:",
                "e.g. João da Silva",
                initial.name,
                2,
                "Name must be at least 2 characters.",
            ),
            (
                "Employee ID:",
                "e.g. SPX123456",
                initial.employee_id,
                1,
                "Employee ID is required.",
            ),
            (
                "Vehicle:",
                "e.g. Fiat Fiorino",
                initial.vehicle,
                2,
                "Vehicle is required.",
            ),
            (
                "License plate:",
                "e.g. BRA2E19",
                initial.plate,
                7,
                "Plate must have 7 characters.",
            ),
        ];
        let mut values = Vec::with_capacity(fields.len());
        for (label, placeholder, current, min, message) in fields {
            let Some(value) = prompt(move || {
                Text::new(label)
                    .with_placeholder(placeholder)
                    .with_initial_value(&current)
                    .with_validator(min_chars(min, message))
                    .prompt()
            })
            .await?
            else {
                return Ok(None);
            };
            values.push(value);
        }
        let mut values = values.into_iter();
        let mut next = || values.next().unwrap_or_default();
        Ok(Some(DriverInput {
            name: next(),
            employee_id: next(),
            vehicle: next(),
            plate: next(),
        }))
    }

    async fn pick_driver(&self, user: &User, label: &str) -> Result<Option<Driver>, DomainError> {
        let mut drivers = self.drivers.list(Some(user)).await?;
        if drivers.is_empty() {
            print!("{}", render::driver_table(&drivers));
            return Ok(None);
        }
        let labels: Vec<String> = drivers.iter().map(render::driver_label).collect();
        let label = label.to_string();
        let choice = prompt(move || Select::new(&label, labels).raw_prompt()).await?;
        Ok(choice.map(|c| drivers.swap_remove(c.index)))
    }

    async fn manage_drivers(&self, user: &User) -> Result<(), DomainError> {
        loop {
            let drivers = self.drivers.list(Some(user)).await?;
            render::print_heading("Drivers");
            print!("{}", render::driver_table(&drivers));

            let options = vec![ADD_DRIVER, EDIT_DRIVER, DELETE_DRIVER, WATCH_DRIVERS, BACK];
            let choice = prompt(move || Select::new("Action:", options).prompt()).await?;
            let result = match choice {
                Some(ADD_DRIVER) => match Self::driver_form(None).await? {
                    Some(input) => self.drivers.create(Some(user), &input).await.map(|_| {
                        render::print_notification(&Notification::info("Driver added.", None))
                    }),
                    None => Ok(()),
                },
                Some(EDIT_DRIVER) => match self.pick_driver(user, "Driver to edit:").await? {
                    Some(driver) => match Self::driver_form(Some(&driver)).await? {
                        Some(input) => self
                            .drivers
                            .update(Some(user), &driver.id, &input)
                            .await
                            .map(|_| {
                                render::print_notification(&Notification::info(
                                    "Driver updated.",
                                    None,
                                ))
                            }),
                        None => Ok(()),
                    },
                    None => Ok(()),
                },
                Some(DELETE_DRIVER) => match self.pick_driver(user, "Driver to delete:").await? {
                    Some(driver) => {
                        let confirmed = prompt(|| {
                            Confirm::new("Are you sure? This permanently deletes the driver.")
                                .with_default(false)
                                .prompt()
                        })
                        .await?
                        .unwrap_or(false);
                        if confirmed {
                            self.drivers.delete(Some(user), &driver.id).await.map(|_| {
                                render::print_notification(&Notification::info(
                                    "Driver deleted.",
                                    None,
                                ))
                            })
                        } else {
                            Ok(())
                        }
                    }
                    None => Ok(()),
                },
                Some(WATCH_DRIVERS) => match self.drivers.watch(Some(user)) {
                    Ok(sub) => self.live_view("Drivers", sub, render::driver_table).await,
                    Err(e) => Err(e),
                },
                _ => return Ok(()),
            };
            if let Err(e) = result {
                report(&e);
            }
        }
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let user = self.identity.current_user().await;
            let Some(choice) = self.main_menu(user.as_ref()).await? else {
                return Ok(());
            };

            let result = match (choice, user.as_ref()) {
                (CHECK_IN, _) => self.run_check_in().await,
                (ACTIVITY_LOG, u) => match self.activity_log.watch(u) {
                    Ok(sub) => self.live_view("Activity log", sub, render::log_table).await,
                    Err(e) => Err(e),
                },
                (DELETE_LOG, Some(u)) => self.delete_log_entry(u).await,
                (MANAGE_DRIVERS, Some(u)) => self.manage_drivers(u).await,
                (SIGN_IN, _) => match self.identity.sign_in().await {
                    Ok(u) => {
                        let welcome = if self.drivers.is_admin(Some(&u)) {
                            "Signed in."
                        } else {
                            "Signed in (not on the admin list; roster management is unavailable)."
                        };
                        render::print_notification(&Notification::info(welcome, None));
                        Ok(())
                    }
                    Err(DomainError::Auth(msg)) => {
                        render::print_error("Sign-in failed", &msg);
                        Ok(())
                    }
                    Err(e) => Err(e),
                },
                (SIGN_OUT, _) => {
                    self.identity.sign_out().await?;
                    render::print_notification(&Notification::info(
                        "You have been signed out.",
                        None,
                    ));
                    Ok(())
                }
                _ => return Ok(()),
            };
            if let Err(e) = result {
                report(&e);
            }
        }
    }
}
