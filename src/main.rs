mod app_logic;
mod core;
mod shell;

use crate::app_logic::SessionController;
use crate::core::{
    path_utils, CoreRandomness, ExerciseDraft, ExerciseId, HistoryStoreOperations,
    JsonHistoryStore, Location, RandomnessOperations, Role, UserAccount,
};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Once};

const APP_NAME: &str = "DailyTrainer";

static LOGGING_INIT: Once = Once::new();

/// Idempotent logger setup. Tests call this from their Arrange blocks, so
/// repeated initialization must be harmless.
pub fn initialize_logging() {
    LOGGING_INIT.call_once(|| {
        if let Err(e) = simplelog::TermLogger::init(
            simplelog::LevelFilter::Info,
            simplelog::Config::default(),
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        ) {
            eprintln!("Logger initialization failed: {e}");
        }
    });
}

struct SeedExercise {
    title: &'static str,
    instructions: &'static str,
    location: Location,
    uses_rep_count: bool,
}

/*
 * The starter catalog. The "#" video placeholder means no real clip exists
 * yet; the shell renders it as such.
 */
const SEED_EXERCISES: &[SeedExercise] = &[
    SeedExercise {
        title: "Sit & Stay",
        instructions: "Ask your dog to sit. Once seated, say 'Stay' and take one step back. \
                       Wait 3 seconds. Step back to the dog and reward. Repeat, gradually \
                       increasing distance and time.",
        location: Location::Anywhere,
        uses_rep_count: false,
    },
    SeedExercise {
        title: "Loose Leash Walking",
        instructions: "Walk with your dog on a loose leash. If they pull, stop immediately \
                       like a tree. Wait for the leash to slacken before moving forward again. \
                       Reward heavily when they walk by your side.",
        location: Location::Outdoor,
        uses_rep_count: false,
    },
    SeedExercise {
        title: "The 'Leave It' Command",
        instructions: "Place a treat in your closed hand. Let the dog sniff or lick. Wait for \
                       them to stop and pull away. The moment they do, say 'Yes!' and give \
                       them a different treat from your other hand.",
        location: Location::Indoor,
        uses_rep_count: false,
    },
    SeedExercise {
        title: "Recall (Come)",
        instructions: "Have a partner hold the dog or put them in a sit stay. Walk away, \
                       crouch down, open your arms and call their name happily with 'Come!'. \
                       Reward with a jackpot of treats when they arrive.",
        location: Location::Outdoor,
        uses_rep_count: false,
    },
    SeedExercise {
        title: "Touch (Hand Target)",
        instructions: "Hold your palm out flat close to the dog's nose. When they sniff or \
                       touch it, click or say 'Yes!' and treat. Repeat until they reliably \
                       bump your hand with their nose.",
        location: Location::Anywhere,
        uses_rep_count: false,
    },
    SeedExercise {
        title: "Rapid-Fire Sits",
        instructions: "Roll for a rep count, then ask for that many quick sits in a row, \
                       rewarding each one. Keep the rhythm fast and upbeat; stop while the \
                       dog still wants more.",
        location: Location::Anywhere,
        uses_rep_count: true,
    },
];

/*
 * Installs the starter catalog and the demo account directory. Exercises
 * are added before the directory exists, while management is still open to
 * the single tenant; the directory then locks management down to the admin
 * account. Added in reverse so the newest-first store renders the catalog
 * in curriculum order.
 */
fn install_seed_data(controller: &mut SessionController) {
    let mut ids_by_title: HashMap<&str, ExerciseId> = HashMap::new();
    for seed in SEED_EXERCISES.iter().rev() {
        let draft = ExerciseDraft {
            title: seed.title.to_string(),
            instructions: seed.instructions.to_string(),
            video_url: "#".to_string(),
            location: seed.location,
            uses_rep_count: seed.uses_rep_count,
        };
        match controller.add_exercise(&draft) {
            Ok(id) => {
                ids_by_title.insert(seed.title, id);
            }
            Err(e) => log::error!("Seed exercise '{}' was rejected: {e}", seed.title),
        }
    }

    let enabled = |titles: &[&str]| -> HashSet<ExerciseId> {
        titles
            .iter()
            .filter_map(|title| ids_by_title.get(title).copied())
            .collect()
    };

    controller.set_user_directory(vec![
        UserAccount {
            email: "trainer@dogtrainer.com".to_string(),
            name: "Toni Trainer".to_string(),
            role: Role::Admin,
            enabled_exercise_ids: ids_by_title.values().copied().collect(),
        },
        UserAccount {
            email: "sam@customer.com".to_string(),
            name: "Sam Customer".to_string(),
            role: Role::Customer,
            enabled_exercise_ids: enabled(&[
                "Sit & Stay",
                "The 'Leave It' Command",
                "Recall (Come)",
            ]),
        },
        UserAccount {
            email: "jamie@customer.com".to_string(),
            name: "Jamie Customer".to_string(),
            role: Role::Customer,
            enabled_exercise_ids: enabled(&["Loose Leash Walking", "Touch (Hand Target)"]),
        },
    ]);
}

fn main() {
    initialize_logging();

    let history_path = path_utils::history_file_path(APP_NAME).unwrap_or_else(|| {
        log::warn!("Could not resolve a config directory; keeping history in the working directory.");
        PathBuf::from("history.json")
    });
    log::info!("DailyTrainer: History file at {history_path:?}");

    let history_store: Arc<dyn HistoryStoreOperations> =
        Arc::new(JsonHistoryStore::new(history_path));
    let randomness: Arc<dyn RandomnessOperations> = Arc::new(CoreRandomness::new());

    let mut controller = SessionController::new(randomness, history_store);
    install_seed_data(&mut controller);

    if let Err(e) = shell::run(&mut controller) {
        log::error!("DailyTrainer: Shell terminated with an I/O error: {e}");
    }
}
