pub mod mock_drone;
