//! Sequential seed runner

use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::{Environment, Seeder};
use crate::database::Database;
use crate::error::{ModelError, ModelResult};

/// Options for one seeding run
#[derive(Debug, Clone, PartialEq)]
pub struct SeedOptions {
    pub environment: Environment,
    /// Allow running in environments that are not safe for seeding
    pub force: bool,
    /// Only run the seeders with these names; empty runs all
    pub files: Vec<String>,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self::new(Environment::from_env())
    }
}

impl SeedOptions {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            force: false,
            files: Vec::new(),
        }
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }
}

/// Outcome of a seeding run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedReport {
    /// Seeders that ran, in order
    pub ran: Vec<String>,
    /// Seeders skipped by the `files` filter or their environment list
    pub skipped: Vec<String>,
    pub duration: Duration,
}

/// Runs registered seeders in registration order
#[derive(Default)]
pub struct SeederRunner {
    seeders: Vec<Box<dyn Seeder>>,
}

impl SeederRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a seeder to the runner
    pub fn add<S: Seeder + 'static>(mut self, seeder: S) -> Self {
        self.register(seeder);
        self
    }

    pub fn register<S: Seeder + 'static>(&mut self, seeder: S) {
        self.seeders.push(Box::new(seeder));
    }

    pub fn names(&self) -> Vec<&str> {
        self.seeders.iter().map(|seeder| seeder.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.seeders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeders.is_empty()
    }

    /// Run the selected seeders, stopping at the first failure
    pub async fn run(&self, db: &Database, options: &SeedOptions) -> ModelResult<SeedReport> {
        let unknown: Vec<&str> = options
            .files
            .iter()
            .map(String::as_str)
            .filter(|file| !self.seeders.iter().any(|seeder| seeder.name() == *file))
            .collect();
        if !unknown.is_empty() {
            return Err(ModelError::Seeder(format!("Unknown seeders: {}", unknown.join(", "))));
        }

        let env = &options.environment;
        if !env.is_safe_for_seeding() {
            if !options.force {
                return Err(ModelError::Seeder(format!(
                    "Environment '{}' is not safe for seeding; force the run to continue",
                    env
                )));
            }
            warn!("Force running seeders in '{}' environment", env);
        }

        let start = Instant::now();
        let mut report = SeedReport::default();

        for seeder in &self.seeders {
            let name = seeder.name();
            let selected = options.files.is_empty() || options.files.iter().any(|file| file == name);
            if !selected || !seeder.should_run(env) {
                report.skipped.push(name.to_string());
                continue;
            }

            info!("Running seeder: {}", name);
            seeder
                .run(db)
                .await
                .map_err(|e| ModelError::Seeder(format!("Seeder '{}' failed: {}", name, e)))?;
            report.ran.push(name.to_string());
        }

        report.duration = start.elapsed();
        info!(
            "Seeding finished in '{}': {} ran, {} skipped",
            env,
            report.ran.len(),
            report.skipped.len()
        );
        Ok(report)
    }
}
