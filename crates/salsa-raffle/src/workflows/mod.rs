pub mod raffle;
