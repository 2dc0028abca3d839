pub mod backend {
    pub mod values;
    pub mod factorgraph;
    pub mod expression;
}

pub mod configuration;

pub mod curve {
    pub mod curve;
    pub mod curveerror;
    pub mod evaluator;
    pub mod vectorspacecurve;
    pub mod discretese3curve;

    pub mod coefficient {
        pub mod key;
        pub mod coefficient;
        pub mod coefficientmanager;
    }

    pub mod policy {
        pub mod extendpolicy;
        pub mod samplingpolicy;
    }
}

pub mod io {
    pub mod curveio;
}

pub mod math {
    pub mod se3;
}
