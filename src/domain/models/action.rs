use super::Generation;
use super::GenerationRequest;

pub enum Action {
    Abort(),
    Generate(Generation, GenerationRequest),
}
