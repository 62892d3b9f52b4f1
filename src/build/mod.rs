//! Level build: ordered CSG of every brush into one level mesh.

mod finalize;
mod operand;

pub use finalize::{Finalize, FinalizeStats, SEAM_MERGE_DISTANCE};
pub use operand::{PrepareOperand, OPERAND_MERGE_DISTANCE};

use tracing::{debug, info, info_span, warn};

use crate::brush::{bucket_by_order, BrushEntry, BrushRegistry, CsgOperation, RefreshBrush};
use crate::capabilities::HostCapabilities;
use crate::config::BuildConfig;
use crate::error::{OperationError, Result};
use crate::math::Matrix4;
use crate::mesh::{ensure_color_layer, PolyMesh};
use crate::operations::boolean::{BooleanSolver, SolverOptions};
use crate::scene::{ObjectId, SceneObject, SceneStore};

/// Name of the object holding the level mesh.
pub const LEVEL_OBJECT_NAME: &str = "LevelGeometry";

/// Where a build currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildState {
    #[default]
    Idle,
    Collecting,
    /// Applying brush `step` (1-based) of `total`.
    OrderedApply { step: usize, total: usize },
    Finalizing,
    Done,
    /// Stopped by an unrecoverable error; `step` is the brush being applied,
    /// 0 before the first one.
    Failed { step: usize },
}

impl BuildState {
    fn step(self) -> usize {
        match self {
            Self::OrderedApply { step, .. } | Self::Failed { step } => step,
            _ => 0,
        }
    }
}

/// Result of one brush step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Applied,
    /// The step was skipped; the level mesh is unchanged.
    Failed(String),
}

/// Report line for one brush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Build-scoped label, `"{OP}[{order}]{index}"`.
    pub label: String,
    pub object: ObjectId,
    pub operation: CsgOperation,
    pub status: StepStatus,
}

/// Summary of a finished build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Object holding the level mesh.
    pub level: ObjectId,
    /// One entry per brush, in application order.
    pub steps: Vec<StepOutcome>,
    pub finalize: FinalizeStats,
}

impl BuildReport {
    /// Number of brushes merged into the level.
    #[must_use]
    pub fn applied(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Applied)
            .count()
    }

    /// Number of brushes skipped after a failure.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.steps.len() - self.applied()
    }
}

/// Build-scoped step label.
#[must_use]
pub fn step_label(operation: CsgOperation, order: i32, index: usize) -> String {
    format!("{}[{order}]{index}", operation.tag())
}

/// Rebuilds the level mesh from every brush in the scene.
///
/// Every brush is refreshed first: material slots are re-synced and its
/// placement and vertices rounded. Brushes are applied in ascending CSG order, ties in discovery order. The
/// level object is reused between builds but always receives a fresh mesh,
/// so the result never depends on a previous build. A brush whose step
/// fails is skipped with a warning and leaves the level mesh untouched.
/// The selection is restored before returning, whatever the outcome.
pub struct BuildLevel<'a> {
    config: &'a BuildConfig,
    solver: &'a dyn BooleanSolver,
    capabilities: HostCapabilities,
    state: BuildState,
}

impl<'a> BuildLevel<'a> {
    /// Creates a build with full host capabilities.
    #[must_use]
    pub fn new(config: &'a BuildConfig, solver: &'a dyn BooleanSolver) -> Self {
        Self {
            config,
            solver,
            capabilities: HostCapabilities::default(),
            state: BuildState::Idle,
        }
    }

    /// Replaces the host capabilities.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: HostCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Runs the build.
    ///
    /// # Errors
    ///
    /// Returns an error, and ends in [`BuildState::Failed`], when the
    /// configuration is invalid, the level object's transform cannot be
    /// inverted, or scene data a brush refers to is missing.
    /// Solver failures are not errors.
    pub fn execute(&mut self, scene: &mut SceneStore) -> Result<BuildReport> {
        let span = info_span!("build", solver = self.solver.name());
        let _guard = span.enter();

        let saved = scene.selection().clone();
        let result = self.run(scene);
        *scene.selection_mut() = saved;

        match &result {
            Ok(report) => info!(
                applied = report.applied(),
                failed = report.failed(),
                "build done"
            ),
            Err(err) => {
                self.state = BuildState::Failed {
                    step: self.state.step(),
                };
                warn!(error = %err, state = ?self.state, "build failed");
            }
        }
        result
    }

    fn transition(&mut self, state: BuildState) {
        debug!(from = ?self.state, to = ?state, "build state");
        self.state = state;
    }

    fn run(&mut self, scene: &mut SceneStore) -> Result<BuildReport> {
        self.transition(BuildState::Collecting);
        self.config.validate()?;

        let level = level_object(scene);
        let level_name = scene.object(level)?.name.clone();
        let mut level_transform = scene.object(level)?.transform;
        level_transform.round_location(self.config.map_precision);
        let to_level = level_transform.inverse_matrix().ok_or_else(|| {
            OperationError::InvalidInput(format!("{level_name} transform is not invertible"))
        })?;
        let mesh_id = scene.add_mesh(PolyMesh::new());
        let object = scene.object_mut(level)?;
        object.transform = level_transform;
        object.mesh = Some(mesh_id);

        let mut accumulator = PolyMesh::new();
        ensure_color_layer(
            &mut accumulator,
            &self.config.color_attribute_name,
            &self.capabilities,
        );
        if self.config.auto_smooth.enabled && self.capabilities.auto_smooth {
            accumulator.set_auto_smooth(Some(self.config.auto_smooth.angle_degrees.to_radians()));
        }

        let ids: Vec<ObjectId> = BrushRegistry::new(scene)
            .entries(Some(level))
            .iter()
            .map(|entry| entry.id)
            .collect();
        for id in ids {
            RefreshBrush::new(id, self.config.map_precision).execute(scene)?;
        }
        let entries = BrushRegistry::new(scene).entries(Some(level));
        let buckets = bucket_by_order(&entries);
        let total = entries.len();
        debug!(brushes = total, orders = buckets.len(), "collected brushes");

        let mut steps = Vec::with_capacity(total);
        for (order, indices) in buckets {
            for index in indices {
                let entry = &entries[index];
                let step = steps.len() + 1;
                self.transition(BuildState::OrderedApply { step, total });
                let label = step_label(entry.brush.operation, order, step - 1);
                let base = scene.mesh(entry.mesh)?;

                let status = match self.apply_step(&accumulator, entry, base, &to_level) {
                    Ok(mesh) => {
                        accumulator = mesh;
                        debug!(brush = %entry.name, %label, faces = accumulator.face_count(), "applied brush");
                        StepStatus::Applied
                    }
                    Err(err) => {
                        warn!(
                            level = %level_name,
                            brush = %entry.name,
                            %label,
                            error = %err,
                            "boolean step failed, brush skipped"
                        );
                        StepStatus::Failed(err.to_string())
                    }
                };
                steps.push(StepOutcome {
                    label,
                    object: entry.id,
                    operation: entry.brush.operation,
                    status,
                });
            }
        }

        self.transition(BuildState::Finalizing);
        let mut transform = scene.object(level)?.transform;
        let finalize =
            Finalize::new(self.config, &self.capabilities).execute(&mut accumulator, &mut transform)?;
        scene.object_mut(level)?.transform = transform;
        *scene.mesh_mut(mesh_id)? = accumulator;

        let collected = scene.collect_garbage();
        debug!(collected, "released unused meshes");
        self.transition(BuildState::Done);

        Ok(BuildReport {
            level,
            steps,
            finalize,
        })
    }

    /// Merges one brush into a copy of the accumulator, which lives in the
    /// level object's local space.
    fn apply_step(
        &self,
        accumulator: &PolyMesh,
        entry: &BrushEntry,
        base: &PolyMesh,
        to_level: &Matrix4,
    ) -> Result<PolyMesh> {
        let mut operand = PrepareOperand::new(entry, self.config, &self.capabilities).execute(base)?;
        operand.transform(&(to_level * entry.transform.matrix()));

        let mut target = accumulator.clone();
        target.materials_mut().append_missing(operand.materials());
        let mesh = self.solver.apply(
            &target,
            &operand,
            entry.brush.operation.into(),
            &SolverOptions::default(),
        )?;
        Ok(mesh)
    }
}

/// Finds the level object, creating it when missing. A brush that happens
/// to carry the level name is never reused.
fn level_object(scene: &mut SceneStore) -> ObjectId {
    let existing = scene
        .objects()
        .find(|(_, object)| object.name == LEVEL_OBJECT_NAME && !object.is_brush())
        .map(|(id, _)| id);
    if let Some(id) = existing {
        return id;
    }
    let mut object = SceneObject::new(scene.unique_name(LEVEL_OBJECT_NAME));
    object.visibility.selectable = false;
    debug!(name = %object.name, "created level object");
    scene.add_object(object)
}
