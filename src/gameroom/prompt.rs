use crate::Position;
use crate::engine::Legal;
use crate::engine::Table;

/// Short position label for `seat`, relative to the button.
pub fn position(seat: Position, button: Position, n: usize) -> String {
    const TWO: &[&str] = &["SB", "BB"];
    const THREE: &[&str] = &["BTN", "SB", "BB"];
    const FOUR: &[&str] = &["BTN", "CO", "SB", "BB"];
    const SIX: &[&str] = &["BTN", "CO", "HJ", "LJ", "SB", "BB"];
    let names = match n {
        0..=2 => TWO,
        3 => THREE,
        4 => FOUR,
        _ => &SIX[..n.min(SIX.len())],
    };
    let relative = (seat + n.max(1) - button % n.max(1)) % n.max(1);
    names
        .get(relative)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("P{}", seat))
}

/// The user message sent to an agent deciding at `seat`.
pub fn prompt(table: &Table, legal: &Legal, seat: Position) -> String {
    let n = table.seats.len();
    let me = table.seats.get(seat);
    let stack = me.map(|s| s.stack).unwrap_or_default();
    let hole = me
        .and_then(|s| s.hole)
        .map(|[a, b]| format!("{} {}", a, b))
        .unwrap_or_else(|| "?? ??".to_string());
    let mut lines = vec![
        format!("Playing {}-handed No-Limit Hold'em.", n),
        format!("Position: {}", position(seat, table.button, n)),
        format!("Stack: {} chips", stack),
        String::new(),
        format!("Hole cards: {}", hole),
    ];
    match table.board.is_empty() {
        true => lines.push("Preflop".to_string()),
        false => lines.push(format!(
            "Board: {}",
            table
                .board
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        )),
    }
    lines.push(String::new());
    lines.push(format!("Pot: {} chips", table.pot));
    match legal.call_amount > 0 {
        true => {
            lines.push(format!("To call: {} chips", legal.call_amount));
            lines.push(format!("Actions: Fold, Call {}, Raise", legal.call_amount));
        }
        false => lines.push("Actions: Check, Bet".to_string()),
    }
    lines.join("\n")
}
