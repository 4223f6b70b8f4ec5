/// Hold back current increases until the ramp-up cooldown has elapsed.
///
/// Reductions (`target_a <= prev_a`) are always returned immediately. An
/// increase is held at `prev_a` only when a reduction was recorded and fewer
/// than `ramp_up_time_s` seconds have passed since it. Reaching exactly
/// `ramp_up_time_s` releases the hold.
///
/// Timestamps are monotonic seconds.
pub fn apply_ramp_up_limit(
    prev_a: f64,
    target_a: f64,
    last_reduction_time: Option<f64>,
    now: f64,
    ramp_up_time_s: f64,
) -> f64 {
    if target_a > prev_a
        && let Some(reduced_at) = last_reduction_time
        && now - reduced_at < ramp_up_time_s
    {
        return prev_a;
    }
    target_a
}
