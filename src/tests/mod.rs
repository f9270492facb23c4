use fixture::Fixture;


mod input;
