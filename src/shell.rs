/*
 * Line-oriented terminal front end. This is the presentation collaborator:
 * it reads commands, calls the session controller's operations, and renders
 * the derived state as text. No rules live here; anything the shell prints
 * it read back from the controller after the operation ran.
 *
 * The randomize command sleeps briefly between `begin_pick` and
 * `resolve_pick` so picking feels like a spin, matching the artificial
 * latency of the original interface. The controller itself never waits.
 */
use crate::app_logic::{SessionController, SessionError};
use crate::core::{ExerciseId, HistoryFilter, Location};
use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

const PICK_DELAY: Duration = Duration::from_millis(400);

pub fn run(controller: &mut SessionController) -> io::Result<()> {
    let stdin = io::stdin();
    let mut out = io::stdout();

    writeln!(out, "Daily Trainer. Type 'help' for commands.")?;
    print_actor(controller, &mut out)?;

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "quit" | "exit" => break,
            "help" => print_help(&mut out)?,
            "users" => print_users(controller, &mut out)?,
            "user" => {
                if controller.set_actor(rest) {
                    print_actor(controller, &mut out)?;
                } else {
                    writeln!(out, "No account '{rest}'; nothing is visible until you pick one.")?;
                }
            }
            "spin" => spin(controller, &mut out)?,
            "show" => print_lesson(controller, &mut out)?,
            "done" => match controller.mark_done(now()) {
                Ok(entry) => writeln!(out, "Logged '{}' at {}.", entry.title, entry.time_label)?,
                Err(e) => writeln!(out, "{e}")?,
            },
            "reps" => match controller.reroll_rep_count() {
                Some(count) => writeln!(out, "New rep count: {count}.")?,
                None => writeln!(out, "The current drill does not use a rep count.")?,
            },
            "video" => print_video(controller, &mut out)?,
            "list" => print_visible(controller, &mut out)?,
            "filter" => set_location_filter(controller, rest, &mut out)?,
            "log" => print_log(controller, rest, &mut out)?,
            "summary" => print_summary(controller, &mut out)?,
            "clearlog" => {
                controller.clear_history();
                writeln!(out, "History cleared.")?;
            }
            "manage" => match controller.open_manager() {
                Ok(()) => print_manager(controller, &mut out)?,
                Err(e) => writeln!(out, "{e}")?,
            },
            "cancel" => {
                controller.close_manager();
                writeln!(out, "Closed the manager.")?;
            }
            "edit" => with_id(rest, &mut out, |id, out| {
                match controller.edit_from_list(id) {
                    Ok(()) => writeln!(out, "Editing '{}'.", controller.form_draft().title),
                    Err(e) => writeln!(out, "{e}"),
                }
            })?,
            "new" => match controller.start_new_draft() {
                Ok(()) => writeln!(out, "Creating a new session; set title/steps then 'save'.")?,
                Err(e) => writeln!(out, "{e}")?,
            },
            "title" => update_draft(controller, &mut out, |draft| draft.title = rest.to_string())?,
            "steps" => {
                update_draft(controller, &mut out, |draft| draft.instructions = rest.to_string())?
            }
            "url" => {
                update_draft(controller, &mut out, |draft| draft.video_url = rest.to_string())?
            }
            "loc" => match Location::parse(rest) {
                Some(location) => {
                    update_draft(controller, &mut out, |draft| draft.location = location)?
                }
                None => writeln!(out, "Locations: anywhere, indoor, outdoor.")?,
            },
            "flag" => match rest {
                "on" | "off" => {
                    let wanted = rest == "on";
                    update_draft(controller, &mut out, |draft| draft.uses_rep_count = wanted)?
                }
                _ => writeln!(out, "Usage: flag on|off")?,
            },
            "save" => match controller.save_draft() {
                Ok(id) => writeln!(out, "Saved session {id}.")?,
                Err(e) => writeln!(out, "{e}")?,
            },
            "sel" => with_id(rest, &mut out, |id, out| match controller.toggle_select(id) {
                Ok(true) => writeln!(out, "Selected {id}."),
                Ok(false) => writeln!(out, "Deselected {id}."),
                Err(e) => writeln!(out, "{e}"),
            })?,
            "selall" => match controller.toggle_select_all() {
                Ok(()) => writeln!(out, "{} selected.", controller.selected_ids().len())?,
                Err(e) => writeln!(out, "{e}")?,
            },
            "del" => with_id(rest, &mut out, |id, out| match controller.delete_one(id) {
                Ok(()) => writeln!(out, "Deleted {id}."),
                Err(e) => writeln!(out, "{e}"),
            })?,
            "delsel" => match controller.delete_selected() {
                Ok(count) => writeln!(out, "Deleted {count} sessions.")?,
                Err(e) => writeln!(out, "{e}")?,
            },
            other => writeln!(out, "Unknown command '{other}'; try 'help'.")?,
        }
    }
    Ok(())
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn print_help(out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "Commands:\n\
         \x20 spin              pick a random drill\n\
         \x20 show              show the current drill again\n\
         \x20 done              log the current drill as completed\n\
         \x20 reps              reroll the rep count\n\
         \x20 video             show the video reference\n\
         \x20 list              drills visible to the active account\n\
         \x20 filter LOC        anywhere | indoor | outdoor\n\
         \x20 log [MODE]        day | week | all | YYYY-MM-DD\n\
         \x20 summary           completions grouped by day\n\
         \x20 clearlog          wipe the completion log\n\
         \x20 users / user EMAIL  switch the active account\n\
         \x20 manage            open the session manager (admin)\n\
         \x20 edit N / new / cancel\n\
         \x20 title T / steps S / url U / loc L / flag on|off\n\
         \x20 save / sel N / selall / del N / delsel\n\
         \x20 quit"
    )
}

fn print_actor(controller: &SessionController, out: &mut impl Write) -> io::Result<()> {
    match controller.active_user() {
        Some(user) => writeln!(
            out,
            "Signed in as {} <{}> ({}).",
            user.name,
            user.email,
            user.role.label()
        ),
        None => writeln!(out, "No account selected; nothing is visible."),
    }
}

fn print_users(controller: &SessionController, out: &mut impl Write) -> io::Result<()> {
    for user in controller.user_directory() {
        writeln!(out, "  {} <{}> ({})", user.name, user.email, user.role.label())?;
    }
    Ok(())
}

fn spin(controller: &mut SessionController, out: &mut impl Write) -> io::Result<()> {
    match controller.begin_pick() {
        Ok(true) => {}
        Ok(false) => return writeln!(out, "Still picking; hold on."),
        Err(e) => return writeln!(out, "{e}"),
    }
    writeln!(out, "Shuffling...")?;
    out.flush()?;
    thread::sleep(PICK_DELAY);

    match controller.resolve_pick() {
        Ok(_) => print_lesson(controller, out),
        Err(e) => writeln!(out, "{e}"),
    }
}

fn print_lesson(controller: &SessionController, out: &mut impl Write) -> io::Result<()> {
    let Some(lesson) = controller.current_lesson() else {
        return writeln!(out, "No drill is active; 'spin' to pick one.");
    };
    writeln!(out, "Current drill: {} [{}]", lesson.title, lesson.location.label())?;
    writeln!(out, "  {}", lesson.instructions)?;
    if let Some(count) = controller.rep_count() {
        writeln!(out, "  Reps this session: {count}")?;
    }
    Ok(())
}

fn print_video(controller: &SessionController, out: &mut impl Write) -> io::Result<()> {
    match controller.current_lesson() {
        Some(lesson) if lesson.has_real_video() => {
            let url = lesson.video_url.as_deref().unwrap_or_default();
            writeln!(out, "Video for '{}': {url}", lesson.title)
        }
        Some(lesson) => writeln!(out, "No video is available for '{}'.", lesson.title),
        None => writeln!(out, "{}", SessionError::NoLesson),
    }
}

fn print_visible(controller: &SessionController, out: &mut impl Write) -> io::Result<()> {
    let visible = controller.visible_exercises();
    if visible.is_empty() {
        return writeln!(out, "No sessions are available for this account.");
    }
    writeln!(out, "{} visible:", visible.len())?;
    for exercise in visible {
        writeln!(out, "  {} {} [{}]", exercise.id, exercise.title, exercise.location.label())?;
    }
    Ok(())
}

fn set_location_filter(
    controller: &mut SessionController,
    arg: &str,
    out: &mut impl Write,
) -> io::Result<()> {
    match Location::parse(arg) {
        Some(location) => {
            controller.set_location_filter(Some(location));
            writeln!(out, "Location filter: {}.", location.label())
        }
        None if arg.is_empty() => {
            controller.set_location_filter(None);
            writeln!(out, "Location filter cleared.")
        }
        None => writeln!(out, "Locations: anywhere, indoor, outdoor."),
    }
}

fn print_log(controller: &mut SessionController, arg: &str, out: &mut impl Write) -> io::Result<()> {
    let today = now().date();
    match arg {
        "" | "day" => controller.set_history_filter(HistoryFilter::Day(None)),
        "week" => controller.set_history_filter(HistoryFilter::Week),
        "all" => controller.set_history_filter(HistoryFilter::All),
        other => match parse_day(other) {
            Some(day) => controller.set_history_filter(HistoryFilter::Day(Some(day))),
            None => return writeln!(out, "Log modes: day, week, all, or a YYYY-MM-DD date."),
        },
    }

    let view = controller.history_view(today);
    if view.is_empty() {
        return writeln!(out, "No sessions completed in this range.");
    }
    writeln!(out, "{} completed:", view.len())?;
    for entry in view {
        writeln!(out, "  {}  {}  {}", entry.day(), entry.time_label, entry.title)?;
    }
    Ok(())
}

fn print_summary(controller: &SessionController, out: &mut impl Write) -> io::Result<()> {
    const SHOWN_PER_DAY: usize = 3;
    let grouped = controller.history_by_day();
    if grouped.is_empty() {
        return writeln!(out, "No sessions completed yet.");
    }
    for (day, entries) in grouped {
        writeln!(out, "{day} ({} completed)", entries.len())?;
        for entry in entries.iter().take(SHOWN_PER_DAY) {
            writeln!(out, "  {}  {}", entry.time_label, entry.title)?;
        }
        if entries.len() > SHOWN_PER_DAY {
            writeln!(out, "  ... and {} more", entries.len() - SHOWN_PER_DAY)?;
        }
    }
    Ok(())
}

fn print_manager(controller: &SessionController, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "All sessions ({}):", controller.catalog().len())?;
    for exercise in controller.catalog() {
        let mark = if controller.selected_ids().contains(&exercise.id) {
            "[x]"
        } else {
            "[ ]"
        };
        writeln!(out, "  {mark} {} {}", exercise.id, exercise.title)?;
    }
    match controller.editing_target_id() {
        Some(id) => writeln!(out, "Editing session {id}."),
        None => writeln!(out, "Creating a new training session."),
    }
}

fn update_draft(
    controller: &mut SessionController,
    out: &mut impl Write,
    apply: impl FnOnce(&mut crate::core::ExerciseDraft),
) -> io::Result<()> {
    let mut draft = controller.form_draft().clone();
    apply(&mut draft);
    controller.set_form_draft(draft);
    writeln!(out, "Draft updated.")
}

fn with_id(
    arg: &str,
    out: &mut impl Write,
    action: impl FnOnce(ExerciseId, &mut dyn Write) -> io::Result<()>,
) -> io::Result<()> {
    match arg.parse::<u64>() {
        Ok(raw) => action(ExerciseId(raw), out),
        Err(_) => writeln!(out, "Expected a numeric session id."),
    }
}

fn parse_day(text: &str) -> Option<Date> {
    let description = format_description!("[year]-[month]-[day]");
    Date::parse(text, &description).ok()
}
