//! Records per-generation progress via the engine's generation observer.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::GenerationSnapshot;

/// A single recorded generation.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRecord {
    /// Generation counter after the step completed
    pub generation: usize,
    /// Best vector of the shard at that point
    pub best_x: Vec<f64>,
    /// Best fitness of the shard at that point
    pub best_fitness: f64,
    /// Location parameter of the mutation factor draws
    pub mu_f: f64,
    /// Location parameter of the crossover rate draws
    pub mu_cr: f64,
    /// Number of accepted trials in the generation
    pub accepted: usize,
    /// Whether the generation improved on the best known fitness
    pub is_improvement: bool,
}

/// Collects [`GenerationRecord`]s through an observer callback and can
/// save them to a CSV file.
#[derive(Debug)]
pub struct OptimizationRecorder {
    /// Run name (used for the CSV filename)
    run_name: String,
    records: Arc<Mutex<Vec<GenerationRecord>>>,
    best_value: Arc<Mutex<Option<f64>>>,
}

impl OptimizationRecorder {
    /// Create a new recorder for the given run.
    pub fn new(run_name: String) -> Self {
        Self {
            run_name,
            records: Arc::new(Mutex::new(Vec::new())),
            best_value: Arc::new(Mutex::new(None)),
        }
    }

    /// Observer to hand to `SubPopulation::set_generation_observer`.
    pub fn create_observer(&self) -> Box<dyn FnMut(&GenerationSnapshot) + Send> {
        let records = self.records.clone();
        let best_value = self.best_value.clone();

        Box::new(move |snapshot: &GenerationSnapshot| {
            let mut best_guard = match best_value.lock() {
                Ok(guard) => guard,
                Err(_) => return,
            };
            let is_improvement = match *best_guard {
                Some(best) => snapshot.target.improves(snapshot.fun, best),
                None => true,
            };
            if is_improvement {
                *best_guard = Some(snapshot.fun);
            }
            drop(best_guard);

            if let Ok(mut records_guard) = records.lock() {
                records_guard.push(GenerationRecord {
                    generation: snapshot.generation,
                    best_x: snapshot.x.to_vec(),
                    best_fitness: snapshot.fun,
                    mu_f: snapshot.mu_f,
                    mu_cr: snapshot.mu_cr,
                    accepted: snapshot.accepted,
                    is_improvement,
                });
            }
        })
    }

    /// Copy of all recorded generations.
    pub fn records(&self) -> Vec<GenerationRecord> {
        self.records.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Best-fitness value of every recorded generation, in order.
    pub fn best_fitness_trace(&self) -> Vec<f64> {
        self.records
            .lock()
            .map(|g| g.iter().map(|r| r.best_fitness).collect())
            .unwrap_or_default()
    }

    /// Number of generations recorded so far.
    pub fn num_generations(&self) -> usize {
        self.records.lock().map(|g| g.len()).unwrap_or(0)
    }

    /// Drop all recorded generations.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.records.lock() {
            guard.clear();
        }
        if let Ok(mut guard) = self.best_value.lock() {
            *guard = None;
        }
    }

    /// Save all recorded generations to `<output_dir>/<run_name>.csv` and
    /// return the file path.
    pub fn save_to_csv(&self, output_dir: &str) -> std::io::Result<String> {
        create_dir_all(output_dir)?;

        let filename = format!("{}/{}.csv", output_dir, self.run_name);
        let mut file = File::create(&filename)?;

        let records = self.records();
        if records.is_empty() {
            return Ok(filename);
        }

        let num_dimensions = records[0].best_x.len();
        write!(file, "generation,")?;
        for i in 0..num_dimensions {
            write!(file, "x{},", i)?;
        }
        writeln!(file, "best_fitness,mu_f,mu_cr,accepted,is_improvement")?;

        for record in &records {
            write!(file, "{},", record.generation)?;
            for &xi in &record.best_x {
                write!(file, "{:.16},", xi)?;
            }
            writeln!(
                file,
                "{:.16},{:.6},{:.6},{},{}",
                record.best_fitness, record.mu_f, record.mu_cr, record.accepted, record.is_improvement
            )?;
        }

        Ok(filename)
    }
}
