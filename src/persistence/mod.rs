pub mod files;
pub mod records;

pub use files::{
    atomic_write, cards_dir, cards_state_file, encouragements_file, ensure_data_dir,
    get_data_dir, history_file, meta_file, read_file, tasks_file,
};
pub use records::{
    load_card_state, load_encouragements, load_goal, load_history, load_tasks,
    save_card_state, save_goal, save_history, save_tasks, CardStateRecord, MetaRecord,
    TaskRecord,
};
