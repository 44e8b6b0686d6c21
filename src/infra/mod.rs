pub mod yelp;
