//! Named formulation constants.
//!
//! Every big-M style value lives here with the derivation of why it is
//! safely large, instead of being hardcoded inside constraint builders.

/// Upper bound on the volume a single warehouse can ship in the activation
/// constraint. Total system demand defaults to 100 000 units and realistic
/// overrides stay well below seven digits, so this deactivates the
/// constraint cleanly whenever the open indicator is 1 without distorting
/// the relaxation.
pub const BIG_M: f64 = 9_999_999.0;

/// Default floor substituted for any warehouse-township distance before it
/// is used as a divisor. Small enough to be negligible in cost terms,
/// large enough that trip-frequency ratios stay finite for collocated
/// pairs.
pub const DEFAULT_DISTANCE_FLOOR_KM: f64 = 0.001;

/// Planning month length used to convert daily working hours into a
/// monthly trip frequency per despatcher.
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Priority-weighted penalty for leaving a job unfilled. The schedule is
/// expressed in minutes over a working day, so the worst achievable
/// priority-weighted lateness stays below this value and an unfilled job
/// always costs more than any late one.
pub const UNFILLED_JOB_PENALTY: f64 = 6_100.0;

/// Weight of the time-window correction slacks relative to the unfilled
/// penalty. Corrections are tolerated but never free.
pub const WINDOW_SLACK_WEIGHT: f64 = 0.01;

/// Latest plausible service start in minutes; the base of the big-M used
/// to relax temporal propagation on arcs a technician does not traverse.
pub const SCHEDULE_HORIZON: f64 = 600.0;
