use burn::tensor::Tensor;
use burn_ndarray::NdArray;
use cryoslice_core::{
    CenteredDft, CryoError, DensityMap, InterpolationKernel, ObservationConfig, ObservationModel,
    PoseBatch, RadialMask, VolumePremultiplier,
};

type B = NdArray<f32>;

fn blob_volume(d: usize) -> cryoslice_core::FourierVolume<B> {
    let device = Default::default();
    let dft = CenteredDft::<B>::new(d, &device).unwrap();
    let pre = VolumePremultiplier::new(InterpolationKernel::Linear, d).unwrap();
    DensityMap::<B>::gaussian_blob(d, [1.0, -0.5, 0.0], 1.5, 1.0, &device)
        .unwrap()
        .to_fourier(&dft, &pre)
        .unwrap()
}

fn poses(device: &<B as burn::tensor::backend::Backend>::Device) -> PoseBatch<B> {
    let angles = Tensor::<B, 2>::from_floats([[0.2, 0.9, -0.3], [1.4, 0.1, 2.0]], device);
    let shifts = Tensor::<B, 2>::from_floats([[0.5, -1.0], [0.0, 2.25]], device);
    PoseBatch::from_euler(angles, shifts).unwrap()
}

#[test]
fn test_zero_noise_is_deterministic() {
    let device = Default::default();
    let d = 8;
    let volume = blob_volume(d).repeat(2).unwrap();
    let model = ObservationModel::<B>::new(d, InterpolationKernel::Linear, 0.0, &device).unwrap();

    let a = model.observe(&volume, &poses(&device)).unwrap();
    let b = model.observe(&volume, &poses(&device)).unwrap();
    assert!(a.distribution.is_none());
    assert_eq!(
        a.projection.re.clone().into_data().to_vec::<f32>().unwrap(),
        b.projection.re.clone().into_data().to_vec::<f32>().unwrap()
    );
    assert_eq!(
        a.sample().im.into_data().to_vec::<f32>().unwrap(),
        b.sample().im.into_data().to_vec::<f32>().unwrap()
    );
}

#[test]
fn test_negative_noise_is_rejected() {
    let device = Default::default();
    let result = ObservationModel::<B>::new(8, InterpolationKernel::Linear, -0.1, &device);
    assert!(matches!(result, Err(CryoError::InvalidNoise(_))));
}

#[test]
fn test_log_likelihood_of_mean_decreases_with_sigma() {
    let device = Default::default();
    let d = 8;
    let volume = blob_volume(d).repeat(2).unwrap();

    let mut previous = f64::INFINITY;
    for sigma in [0.1, 0.2, 0.5, 1.0, 2.0] {
        let model = ObservationModel::<B>::new(d, InterpolationKernel::Linear, sigma, &device).unwrap();
        let observation = model.observe(&volume, &poses(&device)).unwrap();
        let observed = observation.projection.clone();
        let ll: Vec<f32> = model
            .log_likelihood(&observation, &observed)
            .unwrap()
            .into_data()
            .to_vec()
            .unwrap();
        let total: f64 = ll.iter().map(|v| *v as f64).sum();
        assert!(total < previous, "sigma {} gave {} >= {}", sigma, total, previous);
        previous = total;
    }
}

#[test]
fn test_noisy_samples_differ_from_mean_only_inside_noise_scale() {
    let device = Default::default();
    let d = 8;
    let volume = blob_volume(d);
    let model = ObservationConfig::new(d)
        .with_noise_std(0.05)
        .init::<B>(&device)
        .unwrap();
    let observation = model.observe(&volume, &PoseBatch::identity(1, &device)).unwrap();

    let mean = observation.projection.re.clone().into_data().to_vec::<f32>().unwrap();
    let sample = observation.sample().re.into_data().to_vec::<f32>().unwrap();
    let max_dev = mean
        .iter()
        .zip(sample.iter())
        .map(|(m, s)| (m - s).abs())
        .fold(0.0f32, f32::max);
    assert!(max_dev > 0.0);
    assert!(max_dev < 0.05 * 8.0);
}

#[test]
fn test_nyquist_mask_at_128() {
    let d = 128;
    let mask = RadialMask::nyquist(d).unwrap();
    assert_eq!(mask.radius(), 64);

    let half = (d / 2) as i64;
    for (idx, value) in mask.values().iter().enumerate() {
        let v = (idx / d) as i64 - half;
        let u = (idx % d) as i64 - half;
        let inside = u * u + v * v <= 63 * 63;
        assert_eq!(*value == 1.0, inside, "pixel (v={}, u={})", v, u);
    }

    let expected = std::f64::consts::PI * 63.0 * 63.0;
    let count = mask.count() as f64;
    assert!((count - expected).abs() / expected < 0.01, "count {} vs {}", count, expected);
}

#[test]
fn test_likelihood_ignores_coefficients_outside_mask() {
    let device = Default::default();
    let d = 8;
    let volume = blob_volume(d).repeat(2).unwrap();
    let model = ObservationModel::<B>::new(d, InterpolationKernel::Linear, 0.5, &device).unwrap();
    let observation = model.observe(&volume, &poses(&device)).unwrap();

    // Corrupt only the coefficients the Nyquist mask drops.
    let outside: Vec<f32> = model
        .mask()
        .values()
        .iter()
        .map(|m| if *m == 0.0 { 100.0 } else { 0.0 })
        .collect();
    let corruption = Tensor::<B, 2>::from_data(
        burn::tensor::TensorData::new(outside, burn::tensor::Shape::new([d, d])),
        &device,
    )
    .reshape([1, d, d])
    .expand([2, d, d]);
    let clean = observation.projection.clone();
    let corrupted = cryoslice_core::ComplexTensor::new(clean.re.clone() + corruption, clean.im.clone());

    let a = model.log_likelihood(&observation, &clean).unwrap().into_data().to_vec::<f32>().unwrap();
    let b = model
        .log_likelihood(&observation, &corrupted)
        .unwrap()
        .into_data()
        .to_vec::<f32>()
        .unwrap();
    assert_eq!(a, b);
}
