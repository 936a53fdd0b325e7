//! Menu texts and inline keyboard layouts.
//!
//! Keyboards carry the callback payloads the engine parses back out of
//! button presses: category indices, item codes, destination
//! fingerprints, and the fixed `next`/`back`/`skip` controls.

use crate::domain::catalog::{Category, Item};
use crate::domain::destination::Destination;
use crate::ports::{Button, Keyboard};

/// Callback payload of every back button.
pub const CB_BACK: &str = "back";
/// Callback payload of the item confirmation button.
pub const CB_NEXT: &str = "next";
/// Callback payload of the skip-comment button.
pub const CB_SKIP: &str = "skip";
/// Prefix of destination selection payloads.
pub const CB_DEST_PREFIX: &str = "dest:";

/// Search results beyond this are not rendered.
pub const MAX_SEARCH_RESULTS: usize = 10;

pub const TXT_GREETING: &str =
    "Hi! Send /order to place a supply order, /abort to cancel one in progress.";
pub const TXT_CHOOSE_CATEGORY: &str = "Choose a category";
pub const TXT_CHOOSE_ITEM: &str = "Choose an item";
pub const TXT_ASK_COUNT: &str = "How many do you need? Reply with a number.";
pub const TXT_ASK_DEADLINE: &str = "By when? Reply with a date like 28.02.";
pub const TXT_ASK_DESTINATION: &str =
    "Where should it be delivered? Pick a recent destination or type part of a name to search.";
pub const TXT_ASK_COMMENT: &str = "Any comment for the order? Reply with text or skip.";
pub const TXT_ITEM_CONFIRMED: &str = "Item confirmed.";
pub const TXT_NO_COMMENT: &str = "No comment.";
pub const TXT_NO_MATCHES: &str = "No destinations matched, try another search.";
pub const TXT_ABORTED: &str = "Order cancelled.";
pub const TXT_NOTHING_TO_ABORT: &str = "There is no order in progress.";
pub const TXT_ALREADY_ORDERING: &str =
    "An order is already in progress. Finish it or send /abort first.";
pub const TXT_CATALOG_UNAVAILABLE: &str =
    "The catalog is unavailable right now. Please try again in a minute.";
pub const TXT_DIRECTORY_UNAVAILABLE: &str =
    "The destination list is unavailable right now. Please try again in a minute.";
pub const TXT_RECORD_FAILED: &str =
    "Could not record the order. Nothing was lost - please try again.";
pub const TXT_STALE_ITEM: &str = "That item is no longer available. Please pick again.";
pub const TXT_STALE_DESTINATION: &str =
    "That destination is no longer listed. Please pick again.";
pub const TXT_CACHES_REFRESHED: &str = "Caches cleared; data will be refetched on next read.";

/// One button per category, labeled with its title, payload = index.
pub fn category_menu(categories: &[Category]) -> Keyboard {
    let rows = categories
        .iter()
        .enumerate()
        .map(|(index, category)| vec![Button::new(category.title(), index.to_string())])
        .collect();
    Keyboard::new(rows)
}

/// Two item buttons per row, payload = item code, plus a back row.
pub fn item_menu(category: &Category) -> Keyboard {
    let mut keyboard = Keyboard::default();
    for item in category.items() {
        let button = Button::new(item.display_name(), item.code().to_string());
        match keyboard.rows.last_mut() {
            Some(row) if row.len() == 1 => row.push(button),
            _ => keyboard.rows.push(vec![button]),
        }
    }
    keyboard.push_row(Button::new("Back", CB_BACK));
    keyboard
}

/// Confirm/back pair shown under the item details.
pub fn confirm_menu() -> Keyboard {
    Keyboard::new(vec![vec![
        Button::new("Next", CB_NEXT),
        Button::new("Back", CB_BACK),
    ]])
}

/// Lone back row for the free-text steps.
pub fn back_only() -> Keyboard {
    Keyboard::new(vec![vec![Button::new("Back", CB_BACK)]])
}

/// Skip/back pair for the comment step.
pub fn comment_menu() -> Keyboard {
    Keyboard::new(vec![vec![
        Button::new("Skip", CB_SKIP),
        Button::new("Back", CB_BACK),
    ]])
}

/// One button per destination, payload = prefixed fingerprint, plus a
/// back row.
pub fn destination_menu(destinations: &[Destination]) -> Keyboard {
    let mut keyboard = Keyboard::default();
    for destination in destinations.iter().take(MAX_SEARCH_RESULTS) {
        keyboard.push_row(Button::new(
            destination.name(),
            format!("{}{}", CB_DEST_PREFIX, destination.fingerprint()),
        ));
    }
    keyboard.push_row(Button::new("Back", CB_BACK));
    keyboard
}

/// Details text shown on the confirmation step.
pub fn item_details(item: &Item) -> String {
    if item.description() == item.display_name() {
        format!("{} (code {})", item.display_name(), item.code())
    } else {
        format!(
            "{} (code {})\n{}",
            item.display_name(),
            item.code(),
            item.description()
        )
    }
}

/// Confirmation sent to the requester after recording.
pub fn order_confirmation(order_id: &str) -> String {
    format!("Order #{} has been placed.", order_id)
}

/// Notification text for the broadcast chat.
pub fn order_notification(
    order_id: &str,
    item_name: &str,
    count: u32,
    customer: &str,
    deadline: &str,
    destination: &str,
    comment: &str,
) -> String {
    let mut text = format!(
        "New order #{}: {} x{}\nfor {} by {}\ndeliver to {}",
        order_id, item_name, count, customer, deadline, destination
    );
    if !comment.is_empty() {
        text.push_str("\ncomment: ");
        text.push_str(comment);
    }
    text
}
