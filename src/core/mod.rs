use uuid::Uuid;

pub mod item;

pub mod job;

pub mod step;

/// Generates a short name for steps and jobs that were not given one.
fn build_name() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}
