use rand::Rng;

/// Lines shipped with the app, shown when no encouragements file exists.
pub fn default_lines() -> Vec<String> {
    [
        "你今天的专注很稳，继续保持。",
        "每一分钟投入都在累积优势。",
        "你不是在赶时间，你是在建立能力。",
        "达标是结果，稳定节奏才是核心。",
        "今天的你，已经比昨天更强一点。",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Pick one line at random for the goal-reached message.
pub fn pick(lines: &[String], rng: &mut impl Rng) -> String {
    if lines.is_empty() {
        return "Great work today.".to_string();
    }
    lines[rng.gen_range(0..lines.len())].clone()
}
