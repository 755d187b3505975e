pub mod add_item_to_order_command;
pub mod approve_order_command;
pub mod cancel_order_command;
pub mod create_order_command;
pub mod deliver_order_command;
pub mod remove_item_from_order_command;
pub mod ship_order_command;
pub mod submit_order_command;
pub mod update_item_quantity_command;

pub use add_item_to_order_command::AddItemToOrderCommand;
pub use approve_order_command::ApproveOrderCommand;
pub use cancel_order_command::CancelOrderCommand;
pub use create_order_command::CreateOrderCommand;
pub use deliver_order_command::DeliverOrderCommand;
pub use remove_item_from_order_command::RemoveItemFromOrderCommand;
pub use ship_order_command::ShipOrderCommand;
pub use submit_order_command::SubmitOrderCommand;
pub use update_item_quantity_command::UpdateItemQuantityCommand;
