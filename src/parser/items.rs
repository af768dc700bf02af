use super::Item;

/// Operation descriptors open with one of these verbs or fixed phrases from
/// the source template; everything else in the item region is a device-name
/// fragment. Data-driven so new templates only extend the list.
pub const OPERATION_PREFIXES: &[&str] = &[
    "Очистка",
    "Проверка",
    "Удаление",
    "Чистка",
    "Осмотр",
    "Продуть",
    "Выполнить",
    "Заменять",
    "На акустических",
    "С внутреннего",
    "Для очистки",
];

pub fn is_operation(line: &str) -> bool {
    OPERATION_PREFIXES.iter().any(|p| line.starts_with(p))
}

/// Reduce the item region into (device, operation) pairs. Device fragments
/// accumulate until an operation line closes the group; the buffer is cleared
/// on every operation line whether or not an item was emitted. An operation
/// with no pending fragments yields nothing, and so does a trailing run of
/// fragments with no operation after it.
pub fn segment(region: &[String]) -> Vec<Item> {
    let mut items = Vec::new();
    let mut pending: Vec<&str> = Vec::new();

    for line in region {
        if is_operation(line) {
            let device = pending.join(" ").trim().to_string();
            pending.clear();
            if !device.is_empty() {
                items.push(Item {
                    device,
                    operation: line.clone(),
                });
            }
        } else {
            pending.push(line);
        }
    }

    items
}

// ── Tests ──
