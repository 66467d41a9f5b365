pub mod inventory_scan;
