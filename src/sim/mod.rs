pub mod wind_sim;
