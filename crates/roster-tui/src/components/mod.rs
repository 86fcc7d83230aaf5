pub mod history_list;
pub mod player_detail;
pub mod player_table;
pub mod server_info;
